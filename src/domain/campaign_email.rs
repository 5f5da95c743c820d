use serde::Serialize;

/// Checks the `local@domain.tld` shape: one or more non-whitespace,
/// non-`@` characters, an `@`, the same for the domain, a `.`, then one or
/// more non-whitespace characters. Deliberately not full RFC 5322.
pub fn is_valid_address(candidate: &str) -> bool {
    let Some((local, rest)) = candidate.split_once('@') else {
        return false;
    };

    let sane = |s: &str| !s.is_empty() && !s.chars().any(|c| c.is_whitespace() || c == '@');
    if !sane(local) {
        return false;
    }

    // Any dot may anchor the domain/tld split, as long as what precedes it
    // is a sane domain and what follows it is non-empty and
    // whitespace-free. `a@b.c.` is therefore accepted via the first dot.
    rest.char_indices().any(|(i, c)| {
        c == '.' && {
            let (domain, tld) = (&rest[..i], &rest[i + 1..]);
            sane(domain) && !tld.is_empty() && !tld.chars().any(char::is_whitespace)
        }
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct CampaignEmail(String);

impl CampaignEmail {
    pub fn parse(s: String) -> Result<CampaignEmail, String> {
        if is_valid_address(&s) {
            Ok(Self(s))
        } else {
            Err(format!("{} is not a valid recipient email.", s))
        }
    }

    /// Identity for deduplication: the lower-cased address.
    pub fn normalized(&self) -> String {
        self.0.to_lowercase()
    }
}

impl AsRef<str> for CampaignEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq for CampaignEmail {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl Eq for CampaignEmail {}
