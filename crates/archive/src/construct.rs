use crate::ArchiveFormat;
use crate::error::{Error, ErrorKind};
use std::str::FromStr;

impl FromStr for ArchiveFormat {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "zip" => Ok(ArchiveFormat::Zip),
            "7z" | "7zip" | "7-zip" => Ok(ArchiveFormat::SevenZip),
            _ => exn::bail!(ErrorKind::UnsupportedFormat(s.to_string())),
        }
    }
}
