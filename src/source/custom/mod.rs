use super::{HostsSource, SourceError};

/// A source that only returns the custom records it was created with
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CustomSource {
    records: String,
}

impl HostsSource for CustomSource {
    fn hosts(&self) -> Result<String, SourceError> {
        Ok(self.records.to_owned())
    }
}

impl CustomSource {
    pub fn new(records: &str) -> Self {
        CustomSource {
            records: records.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_return_custom_records() {
        let source = CustomSource::new("1.2.3.4 a.example");
        assert_eq!(source.hosts(), Ok("1.2.3.4 a.example".to_string()));
    }
}
