use super::*;

#[test]
fn test_keccak_of_empty_input() {
    assert_eq!(
        hex::encode(keccak256(b"")),
        "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
    );
}

#[test]
fn test_well_known_selectors() {
    assert_eq!(selector("transfer(address,uint256)"), [0xa9, 0x05, 0x9c, 0xbb]);
    assert_eq!(selector("balanceOf(address)"), [0x70, 0xa0, 0x82, 0x31]);
}

#[test]
fn test_encode_call_bytes32() {
    let arg = [0x11u8; 32];
    let data = encode_call_bytes32("getAddress(bytes32)", &arg);
    assert_eq!(data.len(), 36);
    assert_eq!(&data[..4], &selector("getAddress(bytes32)"));
    assert_eq!(&data[4..], &arg);
}

#[test]
fn test_parse_quantity() {
    assert_eq!(parse_quantity("0x0").unwrap(), 0);
    assert_eq!(parse_quantity("0x1b4").unwrap(), 436);
    assert_eq!(parse_quantity("0X10").unwrap(), 16);
    assert!(parse_quantity("0x").is_err());
    assert!(parse_quantity("0xzz").is_err());
}

#[test]
fn test_parse_data() {
    assert_eq!(parse_data("0x").unwrap(), Vec::<u8>::new());
    assert_eq!(parse_data("0x00ff").unwrap(), vec![0x00, 0xff]);
    assert!(parse_data("0x0").is_err());
}

#[test]
fn test_word_requires_full_length() {
    assert!(Word::from_output(&[0u8; 31]).is_err());
    let mut output = vec![0u8; 64];
    output[31] = 7;
    output[63] = 9;
    assert_eq!(Word::from_output(&output).unwrap().as_u64().unwrap(), 7);
}

#[test]
fn test_word_unsigned_and_signed() {
    let word = Word::from(1_000_000_000_000_000_000u64);
    assert_eq!(word.as_uint(), BigUint::from(1_000_000_000_000_000_000u64));
    assert_eq!(word.as_int(), BigInt::from(1_000_000_000_000_000_000u64));

    let minus_one = Word::new([0xff; 32]);
    assert_eq!(minus_one.as_int(), BigInt::from(-1));
    assert!(minus_one.as_u64().is_err());

    let negative = BigInt::from(-1_500_000_000_000_000_000i64);
    assert_eq!(Word::from(&negative).as_int(), negative);
}

#[test]
fn test_word_as_address() {
    let mut bytes = [0u8; 32];
    bytes[12..].copy_from_slice(&[0xab; 20]);
    let word = Word::new(bytes);
    assert_eq!(word.as_address(), format!("0x{}", "ab".repeat(20)));
    assert!(!word.is_zero());
    assert!(Word::new([0u8; 32]).is_zero());
}
