/// Property-based tests using proptest
/// Tests invariants that should hold for all inputs
use proptest::prelude::*;
use savings_wallet_api::aggregation::{format_currency, progress_percentage};
use savings_wallet_api::sanitize;
use savings_wallet_api::validation::{self, WEAK_PINS};

// Property: rules never panic on arbitrary input
proptest! {
    #[test]
    fn rules_never_panic(input in "\\PC*") {
        let _ = validation::password(&input);
        let _ = validation::email(&input);
        let _ = validation::pin(&input);
        let _ = validation::url(&input);
        let _ = validation::text_length(&input, 0, 500, "Note");
        let _ = sanitize::text(&input);
        let _ = sanitize::url(&input);
    }

    #[test]
    fn four_digit_pins_fail_only_when_weak(pin in "[0-9]{4}") {
        let weak = WEAK_PINS.contains(&pin.as_str());
        prop_assert_eq!(validation::pin(&pin).is_some(), weak);
    }

    #[test]
    fn ages_in_range_pass(age in 1i64..=120) {
        prop_assert!(validation::age(Some(age)).is_none());
    }

    #[test]
    fn ages_out_of_range_fail(age in prop_oneof![i64::MIN..1i64, 121i64..i64::MAX]) {
        prop_assert!(validation::age(Some(age)).is_some());
    }

    #[test]
    fn amounts_in_range_pass(amount in 0.01f64..999_999_999.0) {
        prop_assert!(validation::amount(Some(amount)).is_none());
    }
}

// Property: sanitized output carries no markup
proptest! {
    #[test]
    fn sanitized_text_has_no_tags(word in "[a-z]{1,12}", tag in "(b|i|div|span|script|style)") {
        let input = format!("<{tag}>{word}</{tag}> tail");
        let out = sanitize::text(&input);
        prop_assert!(!out.contains('<'));
        prop_assert!(out.ends_with("tail"));
    }

    #[test]
    fn sanitized_text_is_stable_and_inert(input in "[a-z <>/&;!=]{0,40}") {
        let once = sanitize::text(&input);
        prop_assert!(!once.contains('<'));
        prop_assert_eq!(sanitize::text(&once), once.clone());
    }

    #[test]
    fn sanitized_number_is_digits_and_dots(input in "\\PC*") {
        let out = sanitize::number(&input);
        prop_assert!(out.chars().all(|c| c.is_ascii_digit() || c == '.'));
    }

    #[test]
    fn sanitized_url_keeps_web_scheme(path in "[a-z0-9]{1,10}") {
        let url = format!("https://example.com/{}", path);
        prop_assert_eq!(sanitize::url(&url), Some(url.clone()));
    }
}

// Property: display folds stay in their ranges
proptest! {
    #[test]
    fn progress_is_between_zero_and_hundred(current in 0f64..1e9, target in 0.01f64..1e9) {
        let p = progress_percentage(current, target);
        prop_assert!((0.0..=100.0).contains(&p));
    }

    #[test]
    fn currency_has_two_decimals(amount in 0f64..1e9) {
        let formatted = format_currency(amount);
        prop_assert!(formatted.starts_with('$'));
        let decimals = formatted.rsplit('.').next().unwrap();
        prop_assert_eq!(decimals.len(), 2);
    }
}
