//! Number-to-English-word conversion for generated MSR names
//!
//! Staff, voice and part names embed their numbers as English words
//! (`Part_POne_Staff_Two_Voice_Three`), which keeps them valid identifiers
//! for the LilyPond backend.

/// Convert an integer to its English word form, `CamelCase` with no spaces.
///
/// Negative numbers get a `Minus_` prefix.
pub fn int_to_english_word(n: i64) -> String {
    if n < 0 {
        return format!("Minus_{}", int_to_english_word(-n));
    }

    if n >= 1000 {
        let thousands = format!("{}Thousand", int_to_english_word(n / 1000));
        return match n % 1000 {
            0 => thousands,
            rest => format!("{}{}", thousands, int_to_english_word(rest)),
        };
    }

    if n >= 100 {
        let hundreds = format!("{}Hundred", int_to_english_word(n / 100));
        return match n % 100 {
            0 => hundreds,
            rest => format!("{}And{}", hundreds, int_to_english_word(rest)),
        };
    }

    const UNITS: [&str; 20] = [
        "Zero", "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine", "Ten",
        "Eleven", "Twelve", "Thirteen", "Fourteen", "Fifteen", "Sixteen", "Seventeen",
        "Eighteen", "Nineteen",
    ];
    const TENS: [&str; 10] = [
        "", "", "Twenty", "Thirty", "Forty", "Fifty", "Sixty", "Seventy", "Eighty", "Ninety",
    ];

    if n < 20 {
        return UNITS[n as usize].to_string();
    }

    let tens = TENS[(n / 10) as usize];
    match n % 10 {
        0 => tens.to_string(),
        units => format!("{}{}", tens, UNITS[units as usize]),
    }
}

/// Replace every run of ASCII digits in `text` by its English word form.
///
/// `"P12"` becomes `"PTwelve"`; an empty string becomes `"NONE"`.
pub fn string_numbers_to_english_words(text: &str) -> String {
    if text.is_empty() {
        return "NONE".to_string();
    }

    let mut result = String::with_capacity(text.len() * 2);
    let mut digits = String::new();

    for ch in text.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }

        if !digits.is_empty() {
            result.push_str(&digits_to_word(&digits));
            digits.clear();
        }
        result.push(ch);
    }

    if !digits.is_empty() {
        result.push_str(&digits_to_word(&digits));
    }

    result
}

fn digits_to_word(digits: &str) -> String {
    match digits.parse::<i64>() {
        Ok(value) => int_to_english_word(value),
        // too many digits for i64, keep them as they are
        Err(_) => digits.to_string(),
    }
}
