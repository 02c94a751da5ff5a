/// Loose e-mail shape check: one `@`, a non-empty local part, and a dotted
/// domain without whitespace.
///
/// ```
/// use gthome_core::auth::validate_email;
///
/// assert!(validate_email("maria@example.com"));
/// assert!(!validate_email("maria@localhost"));
/// ```
pub fn validate_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

/// Strip punctuation from a CPF and validate its two check digits.
///
/// Returns the eleven bare digits when valid.
pub fn normalize_cpf(cpf: &str) -> Option<String> {
    let digits: Vec<u32> = cpf
        .chars()
        .filter(|c| !matches!(c, '.' | '-' | ' '))
        .map(|c| c.to_digit(10))
        .collect::<Option<_>>()?;

    if digits.len() != 11 || digits.iter().all(|d| *d == digits[0]) {
        return None;
    }

    let check = |len: usize| {
        let sum: u32 = digits[..len]
            .iter()
            .zip((2..=len as u32 + 1).rev())
            .map(|(d, w)| d * w)
            .sum();
        let rest = sum % 11;
        if rest < 2 {
            0
        } else {
            11 - rest
        }
    };

    if check(9) != digits[9] || check(10) != digits[10] {
        return None;
    }

    Some(digits.iter().map(|d| char::from(b'0' + *d as u8)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_emails() {
        assert!(validate_email("maria@example.com"));
        assert!(validate_email("  joao.silva@gthome.com.br "));
    }

    #[test]
    fn rejects_malformed_emails() {
        assert!(!validate_email(""));
        assert!(!validate_email("maria"));
        assert!(!validate_email("@example.com"));
        assert!(!validate_email("maria@@example.com"));
        assert!(!validate_email("maria@example."));
        assert!(!validate_email("ma ria@example.com"));
    }

    #[test]
    fn accepts_valid_cpf_with_or_without_punctuation() {
        assert_eq!(normalize_cpf("529.982.247-25").as_deref(), Some("52998224725"));
        assert_eq!(normalize_cpf("52998224725").as_deref(), Some("52998224725"));
    }

    #[test]
    fn rejects_invalid_cpf() {
        assert_eq!(normalize_cpf("529.982.247-24"), None);
        assert_eq!(normalize_cpf("111.111.111-11"), None);
        assert_eq!(normalize_cpf("1234"), None);
        assert_eq!(normalize_cpf("529.982.247-2X"), None);
    }
}
