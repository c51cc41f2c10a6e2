use crate::Result;
use crate::errors::Error;
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::ToPrimitive;
use sha3::{Digest, Keccak256};

#[cfg(test)]
mod tests;

pub const WORD_SIZE: usize = 32;

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// 関数シグネチャ (例: `getExchangeRate()`) の 4 バイトセレクタ
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// 引数なし呼び出しの calldata
pub fn encode_call(signature: &str) -> Vec<u8> {
    selector(signature).to_vec()
}

/// bytes32 引数を 1 つ取る呼び出しの calldata
pub fn encode_call_bytes32(signature: &str, arg: &[u8; 32]) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + WORD_SIZE);
    data.extend_from_slice(&selector(signature));
    data.extend_from_slice(arg);
    data
}

/// `0x` 付き 16 進数量 (`eth_getBlockByNumber` の number/timestamp など)
pub fn parse_quantity(s: &str) -> Result<u64> {
    let digits = strip_0x(s);
    if digits.is_empty() {
        return Err(Error::InvalidHex(s.to_string()).into());
    }
    u64::from_str_radix(digits, 16).map_err(|_| Error::InvalidHex(s.to_string()).into())
}

/// `0x` 付き 16 進バイト列 (`eth_call` の戻り値など)
pub fn parse_data(s: &str) -> Result<Vec<u8>> {
    hex::decode(strip_0x(s)).map_err(|_| Error::InvalidHex(s.to_string()).into())
}

pub fn to_hex(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// ABI エンコードされた 32 バイトの戻り値
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Word([u8; WORD_SIZE]);

impl Word {
    pub fn new(bytes: [u8; WORD_SIZE]) -> Self {
        Word(bytes)
    }

    /// 戻り値の先頭ワードを取り出す
    pub fn from_output(output: &[u8]) -> Result<Self> {
        if output.len() < WORD_SIZE {
            return Err(Error::UnexpectedResultLength(output.len()).into());
        }
        let mut bytes = [0u8; WORD_SIZE];
        bytes.copy_from_slice(&output[..WORD_SIZE]);
        Ok(Word(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; WORD_SIZE] {
        &self.0
    }

    pub fn as_uint(&self) -> BigUint {
        BigUint::from_bytes_be(&self.0)
    }

    /// int256 として 2 の補数で解釈する
    pub fn as_int(&self) -> BigInt {
        let unsigned = BigInt::from_biguint(Sign::Plus, self.as_uint());
        if self.0[0] & 0x80 == 0 {
            unsigned
        } else {
            unsigned - (BigInt::from(1) << (WORD_SIZE * 8))
        }
    }

    pub fn as_u64(&self) -> Result<u64> {
        let value = self.as_uint();
        value
            .to_u64()
            .ok_or_else(|| Error::Overflow(value.to_string()).into())
    }

    /// 下位 20 バイトをアドレスとして取り出す
    pub fn as_address(&self) -> String {
        to_hex(&self.0[WORD_SIZE - 20..])
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

impl From<u64> for Word {
    fn from(value: u64) -> Self {
        let mut bytes = [0u8; WORD_SIZE];
        bytes[WORD_SIZE - 8..].copy_from_slice(&value.to_be_bytes());
        Word(bytes)
    }
}

impl From<&BigInt> for Word {
    fn from(value: &BigInt) -> Self {
        let bytes = value.to_signed_bytes_be();
        let fill = if value.sign() == Sign::Minus { 0xff } else { 0x00 };
        let mut word = [fill; WORD_SIZE];
        let len = bytes.len().min(WORD_SIZE);
        word[WORD_SIZE - len..].copy_from_slice(&bytes[bytes.len() - len..]);
        Word(word)
    }
}
