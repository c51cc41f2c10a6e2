use crate::embed::Embed;
use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;

const TIME_FORMAT: &str = "%A %H:%M:%S %Z";

/// 表示するタイムゾーンと見出し
pub const ZONES: [(&str, Tz); 3] = [
    ("Coordinated Universal Time", Tz::UTC),
    ("Time for most of the Dev Team", Tz::Australia__Lindeman),
    ("Joe's Time", Tz::America__New_York),
];

pub fn format_in<T: TimeZone>(now: DateTime<Utc>, tz: &T) -> String
where
    T::Offset: std::fmt::Display,
{
    now.with_timezone(tz).format(TIME_FORMAT).to_string()
}

/// 開発チームの各タイムゾーンでの現在時刻
pub fn dev_time(now: DateTime<Utc>) -> Embed {
    ZONES
        .iter()
        .fold(Embed::default(), |embed, (name, tz)| {
            embed.field(name, format_in(now, tz), false)
        })
}
