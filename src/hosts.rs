//! Parsing of hosts-file formatted text into [`Rewrite`]s.
//!
//! Every line has the form `<ip> <domain> [domain...]`.
//! Lines with fewer than two fields are skipped, as are lines whose first field is not a valid IPv4 or IPv6 address.

use std::net::IpAddr;

use log::{trace, warn};

use crate::provider::Rewrite;

/// Parse a hosts-formatted text blob into one [`Rewrite`] per domain.
///
/// The result may contain duplicates; [`crate::plan::Plan::generate()`] treats its input as a set.
pub fn parse_records(hosts: &str) -> Vec<Rewrite> {
    let mut records = Vec::new();

    for line in hosts.lines() {
        let mut fields = line.split_whitespace();
        let (Some(addr), Some(first_domain)) = (fields.next(), fields.next()) else {
            continue;
        };

        if addr.parse::<IpAddr>().is_err() {
            warn!("Ignoring invalid IP address: {}", addr);
            continue;
        }

        for domain in std::iter::once(first_domain).chain(fields) {
            let r = Rewrite {
                name: domain.to_owned(),
                content: addr.to_owned(),
            };
            trace!("Parsed record {}", r);
            records.push(r);
        }
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewrite(name: &str, content: &str) -> Rewrite {
        Rewrite {
            name: name.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn should_emit_one_record_per_domain() {
        assert_eq!(
            parse_records("1.2.3.4 a.example b.example"),
            vec![rewrite("a.example", "1.2.3.4"), rewrite("b.example", "1.2.3.4")]
        );
    }

    #[test]
    fn should_drop_invalid_addresses() {
        assert!(parse_records("not-an-ip a.example").is_empty());
        assert_eq!(
            parse_records("300.1.1.1 bad.example\n10.0.0.1 good.example"),
            vec![rewrite("good.example", "10.0.0.1")]
        );
    }

    #[test]
    fn should_accept_ipv6() {
        assert_eq!(
            parse_records("2001:db8::1 v6.example"),
            vec![rewrite("v6.example", "2001:db8::1")]
        );
    }

    #[test]
    fn should_skip_short_and_blank_lines() {
        let hosts = "\n   \n1.2.3.4\n\t5.6.7.8\tc.example  \r\n";
        assert_eq!(parse_records(hosts), vec![rewrite("c.example", "5.6.7.8")]);
    }

    #[test]
    fn should_keep_duplicates() {
        assert_eq!(
            parse_records("1.1.1.1 a.example\n1.1.1.1 a.example").len(),
            2
        );
    }
}
