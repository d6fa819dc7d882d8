use justconfig::error::ConfigError;
use justconfig::item::{MapAction, StringItem};

/// Strip one pair of matching quotes from configuration strings.
pub trait Unquoted
where
    Self: Sized,
{
    fn unquoted(self) -> Result<StringItem, ConfigError>;
}

impl Unquoted for Result<StringItem, ConfigError> {
    /// Values are trimmed; a value wrapped in `"..."` or `'...'` loses the
    /// quotes. Unquoted values are kept as they are.
    fn unquoted(self) -> Result<StringItem, ConfigError> {
        self?.map(|v| {
            let v = v.trim();
            let quoted = v.len() >= 2
                && ((v.starts_with('"') && v.ends_with('"'))
                    || (v.starts_with('\'') && v.ends_with('\'')));

            if quoted {
                MapAction::Replace(vec![v[1..v.len() - 1].to_owned()])
            } else {
                MapAction::Replace(vec![v.to_owned()])
            }
        })
    }
}
