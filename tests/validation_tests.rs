/// Unit tests for the field rules and sanitizers
/// Covers password, PIN, amount, age, text, URL and email rules plus markup stripping
use savings_wallet_api::validation::{self, WEAK_PINS};
use savings_wallet_api::sanitize;

#[cfg(test)]
mod pin_tests {
    use super::*;

    #[test]
    fn test_weak_pins_rejected() {
        for weak in WEAK_PINS {
            assert!(validation::pin(weak).is_some(), "{} should be rejected", weak);
        }
    }

    #[test]
    fn test_strong_pin_accepted() {
        assert!(validation::pin("0731").is_none());
        assert!(validation::pin("2580").is_none());
    }

    #[test]
    fn test_malformed_pins() {
        assert_eq!(validation::pin("").as_deref(), Some("PIN is required"));
        assert!(validation::pin("123").is_some());
        assert!(validation::pin("12345").is_some());
        assert!(validation::pin("12a4").is_some());
        assert!(validation::pin(" 731").is_some());
    }
}

#[cfg(test)]
mod password_tests {
    use super::*;

    #[test]
    fn test_strong_password() {
        assert!(validation::password("Abc12345!").is_none());
        assert!(validation::password("Ahorro#2025").is_none());
    }

    #[test]
    fn test_weak_passwords() {
        // Missing uppercase and special character; uppercase is reported first
        let err = validation::password("abc12345").unwrap();
        assert!(err.contains("uppercase"));

        assert!(validation::password("").is_some());
        assert!(validation::password("Ab1!x").is_some());
        assert!(validation::password("ABCDEFG1!").is_some());
    }
}

#[cfg(test)]
mod amount_and_age_tests {
    use super::*;

    #[test]
    fn test_amount_bounds() {
        assert!(validation::amount(Some(0.0)).is_some());
        assert!(validation::amount(Some(-5.0)).is_some());
        assert!(validation::amount(Some(0.01)).is_none());
        assert!(validation::amount(Some(999_999_999.0)).is_none());
        assert!(validation::amount(Some(1_000_000_000.0)).is_some());
    }

    #[test]
    fn test_amount_custom_max() {
        let err = validation::amount_between(Some(100.0), 0.01, 50.0).unwrap();
        assert!(err.contains("exceed"));
    }

    #[test]
    fn test_age_bounds() {
        assert!(validation::age(Some(0)).is_some());
        assert!(validation::age(Some(121)).is_some());
        assert!(validation::age(Some(30)).is_none());
        assert!(validation::age(Some(1)).is_none());
        assert!(validation::age(Some(120)).is_none());
        assert!(validation::age(None).is_some());
    }
}

#[cfg(test)]
mod text_and_url_tests {
    use super::*;

    #[test]
    fn test_email_shapes() {
        assert!(validation::email("ana@example.com").is_none());
        assert!(validation::email("a@b.c").is_none());
        assert!(validation::email("ana@example").is_some());
        assert!(validation::email("ana example@mail.com").is_some());
        assert!(validation::email("@example.com").is_some());
        assert!(validation::email("").is_some());
    }

    #[test]
    fn test_text_length_limits() {
        let note = "x".repeat(500);
        assert!(validation::text_length(&note, 0, 500, "Note").is_none());
        let long = "x".repeat(501);
        assert_eq!(
            validation::text_length(&long, 0, 500, "Note").as_deref(),
            Some("Note cannot exceed 500 characters")
        );
    }

    #[test]
    fn test_url_rule() {
        assert!(validation::url("").is_none());
        assert!(validation::url("http://a.com").is_none());
        assert!(validation::url("javascript:alert(1)").is_some());
        assert!(validation::url("a.com/b.png").is_some());
    }
}

#[cfg(test)]
mod sanitize_tests {
    use super::*;

    #[test]
    fn test_script_removed() {
        assert_eq!(sanitize::text("<script>x</script>hello"), "hello");
    }

    #[test]
    fn test_url_sanitizer() {
        assert_eq!(sanitize::url("javascript:alert(1)"), None);
        assert_eq!(
            sanitize::url("https://a.com/b.png").as_deref(),
            Some("https://a.com/b.png")
        );
    }

    #[test]
    fn test_markup_inside_url_is_stripped() {
        assert_eq!(
            sanitize::url("<b>https://a.com/b.png</b>").as_deref(),
            Some("https://a.com/b.png")
        );
    }

    #[test]
    fn test_email_and_number() {
        assert_eq!(sanitize::email("<i>ANA</i>@Mail.com "), "ana@mail.com");
        assert_eq!(sanitize::number("12a.5b"), "12.5");
    }
}
