use chrono::{DateTime, Utc};

/// Format a 10-digit phone number as XXX-XXX-XXXX. Anything that does not
/// carry exactly 10 digits is returned unchanged, so already-dashed values
/// survive a second pass.
pub fn format_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == 10 {
        format!("{}-{}-{}", &digits[..3], &digits[3..6], &digits[6..])
    } else {
        phone.to_string()
    }
}

/// Render a show start time the way the listing pages display it,
/// e.g. "Tue 05, 21, 2019 9:30PM".
pub fn format_start_time(start_time: DateTime<Utc>) -> String {
    start_time.format("%a %m, %d, %Y %-I:%M%p").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_phone_plain_digits() {
        assert_eq!(format_phone("1231231234"), "123-123-1234");
    }

    #[test]
    fn test_format_phone_already_dashed() {
        assert_eq!(format_phone("123-123-1234"), "123-123-1234");
    }

    #[test]
    fn test_format_phone_passthrough() {
        assert_eq!(format_phone("12345"), "12345");
        assert_eq!(format_phone(""), "");
    }

    #[test]
    fn test_format_start_time() {
        let dt = Utc.with_ymd_and_hms(2019, 5, 21, 21, 30, 0).unwrap();
        assert_eq!(format_start_time(dt), "Tue 05, 21, 2019 9:30PM");
    }
}
