use clinic_core::{
    extract_digits, extract_digits_opt, is_valid_document, validate_document,
    validate_document_opt, DocumentError,
};

#[test]
fn accepts_valid_cpf_with_and_without_mask() {
    for value in ["11144477735", "111.444.777-35", "12345678909", "123.456.789-09"] {
        assert_eq!(validate_document(value), Ok(()), "{value} should be valid");
        assert!(is_valid_document(value));
    }
}

#[test]
fn blank_and_absent_input_is_accepted() {
    assert_eq!(validate_document(""), Ok(()));
    assert_eq!(validate_document("   "), Ok(()));
    assert_eq!(validate_document("..-/"), Ok(()));
    assert_eq!(validate_document_opt(None), Ok(()));
    assert_eq!(extract_digits_opt(None), "");
}

#[test]
fn rejects_wrong_digit_count() {
    assert_eq!(
        validate_document("1234567890"),
        Err(DocumentError::InvalidLength { digits: 10 })
    );
    assert_eq!(
        validate_document("123456789012"),
        Err(DocumentError::InvalidLength { digits: 12 })
    );
    assert_eq!(
        validate_document("abc1"),
        Err(DocumentError::InvalidLength { digits: 1 })
    );
}

#[test]
fn rejects_every_repeated_digit_placeholder() {
    for digit in '0'..='9' {
        let value: String = std::iter::repeat(digit).take(11).collect();
        assert_eq!(
            validate_document(&value),
            Err(DocumentError::InvalidDocument),
            "{value} must be rejected"
        );
    }
}

#[test]
fn rejects_tampered_check_digits() {
    assert_eq!(
        validate_document("11144477736"),
        Err(DocumentError::InvalidDocument)
    );
    assert_eq!(
        validate_document("12345678900"),
        Err(DocumentError::InvalidDocument)
    );
    assert_eq!(
        validate_document("123.456.789-00"),
        Err(DocumentError::InvalidDocument)
    );
    // First check digit right, second wrong.
    assert_eq!(
        validate_document("11144477734"),
        Err(DocumentError::InvalidDocument)
    );
}

#[test]
fn extract_digits_keeps_only_ascii_digits_in_order() {
    let samples = [
        "111.444.777-35",
        "a1b2c3",
        "ção 9 8 7",
        "",
        "\u{0663}\u{FF11}42",
        "--99--00--",
    ];
    for sample in samples {
        let digits = extract_digits(sample);
        assert!(digits.chars().all(|ch| ch.is_ascii_digit()));
        let expected: String = sample.chars().filter(char::is_ascii_digit).collect();
        assert_eq!(digits, expected);
    }
    assert_eq!(extract_digits("--99--00--"), "9900");
}

#[test]
fn garbage_input_never_panics() {
    let long = "9".repeat(10_000);
    let inputs = ["\u{0}", "🙂🙂🙂", long.as_str(), "1\n1\t1"];
    for input in inputs {
        let _ = validate_document(input);
    }
    assert!(matches!(
        validate_document(&long),
        Err(DocumentError::InvalidLength { digits: 10_000 })
    ));
}

#[test]
fn error_messages_are_user_facing() {
    assert_eq!(
        DocumentError::InvalidLength { digits: 10 }.to_string(),
        "CPF must have 11 digits, got 10"
    );
    assert_eq!(DocumentError::InvalidDocument.to_string(), "invalid CPF");
}
