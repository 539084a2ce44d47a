//! Account identity records and their portable string serialization.

// self
use crate::{_prelude::*, error::AccountError, extract};

const FIELD_DELIMITER: char = ':';
const FIELD_COUNT: usize = 5;
/// `domain`, `id`, and `token` must be present in a serialized account.
const REQUIRED_FIELDS: usize = 3;

/// Immutable identity record produced by a completed authorization handshake.
///
/// `domain` and `token` are always non-empty; the display fields default to
/// empty strings when a provider does not expose them. For the OAuth1 provider
/// the token is itself a composite of user id, access token, and access token
/// secret joined by `_`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Account {
	/// Canonical provider domain key, e.g. `dropbox`.
	pub domain: String,
	/// Provider-assigned user id; possibly empty.
	pub id: String,
	/// Opaque credential string; never empty.
	pub token: String,
	/// User email address; possibly empty.
	pub email: String,
	/// Display name; possibly empty.
	pub name: String,
}
impl Account {
	/// Creates an account, rejecting empty `domain` or `token` values.
	pub fn new(
		domain: impl Into<String>,
		id: impl Into<String>,
		token: impl Into<String>,
		email: impl Into<String>,
		name: impl Into<String>,
	) -> Result<Self, AccountError> {
		let account = Self {
			domain: domain.into(),
			id: id.into(),
			token: token.into(),
			email: email.into(),
			name: name.into(),
		};

		if account.domain.is_empty() {
			return Err(AccountError::EmptyField { field: "domain" });
		}
		if account.token.is_empty() {
			return Err(AccountError::EmptyField { field: "token" });
		}

		Ok(account)
	}

	/// Reconstructs an account from a string produced by [`Account::serialize`].
	///
	/// Trailing `email`/`name` fields may be omitted; fewer than three fields or
	/// empty required fields fail fast without producing a half-populated record.
	pub fn parse(serialized: &str) -> Result<Self, AccountError> {
		let fields = serialized.split(FIELD_DELIMITER).collect::<Vec<_>>();

		if fields.len() < REQUIRED_FIELDS || fields.len() > FIELD_COUNT {
			return Err(AccountError::MalformedToken {
				found: fields.len(),
				min: REQUIRED_FIELDS,
			});
		}

		let decoded =
			|index: usize| fields.get(index).map(|raw| extract::percent_decode(raw)).unwrap_or_default();

		Self::new(decoded(0), decoded(1), decoded(2), decoded(3), decoded(4))
	}

	/// Serializes the account into its portable token string.
	///
	/// Fields are individually percent-encoded so the delimiter can never occur
	/// inside a value; the result round-trips exactly through [`Account::parse`].
	pub fn serialize(&self) -> String {
		[&self.domain, &self.id, &self.token, &self.email, &self.name]
			.map(|field| extract::percent_encode(field))
			.join(&FIELD_DELIMITER.to_string())
	}
}
// Accounts are the same identity when id and token match; display metadata may
// legitimately change between handshakes.
impl PartialEq for Account {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id && self.token == other.token
	}
}
impl Eq for Account {}
impl Display for Account {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.serialize())
	}
}
impl FromStr for Account {
	type Err = AccountError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn fixture() -> Account {
		Account::new("slack", "U123", "xoxp-1:2", "jane@example.com", "Jane Example")
			.expect("Account fixture should be valid.")
	}

	#[test]
	fn serialization_round_trips_exactly() {
		let account = fixture();
		let serialized = account.serialize();
		let parsed = Account::parse(&serialized).expect("Serialized account should parse back.");

		assert_eq!(parsed.domain, account.domain);
		assert_eq!(parsed.id, account.id);
		assert_eq!(parsed.token, account.token);
		assert_eq!(parsed.email, account.email);
		assert_eq!(parsed.name, account.name);
		assert_eq!(Account::parse(&parsed.serialize()).expect("Round trip should hold."), parsed);
	}

	#[test]
	fn delimiter_inside_fields_is_escaped() {
		let serialized = fixture().serialize();

		assert_eq!(serialized.matches(':').count(), 4, "Only the four delimiters may remain.");
		assert!(serialized.contains("xoxp-1%3A2"));
	}

	#[test]
	fn empty_domain_or_token_is_rejected() {
		assert_eq!(
			Account::new("", "id", "tok", "", ""),
			Err(AccountError::EmptyField { field: "domain" })
		);
		assert_eq!(
			Account::new("slack", "id", "", "e", "n"),
			Err(AccountError::EmptyField { field: "token" })
		);
	}

	#[test]
	fn equality_ignores_display_metadata() {
		let one = fixture();
		let two = Account::new("slack", "U123", "xoxp-1:2", "other@example.com", "Renamed")
			.expect("Comparison fixture should be valid.");
		let three = Account::new("slack", "U999", "xoxp-1:2", "jane@example.com", "Jane Example")
			.expect("Comparison fixture should be valid.");

		assert_eq!(one, two);
		assert_ne!(one, three);
	}

	#[test]
	fn malformed_token_strings_fail_fast() {
		assert!(matches!(
			Account::parse("only-two:fields"),
			Err(AccountError::MalformedToken { found: 2, .. })
		));
		assert!(matches!(
			Account::parse("a:b:c:d:e:f"),
			Err(AccountError::MalformedToken { found: 6, .. })
		));
		// Token field is required even when the separator count is right.
		assert!(matches!(
			Account::parse("slack:U123:"),
			Err(AccountError::EmptyField { field: "token" })
		));
	}

	#[test]
	fn trailing_fields_default_to_empty() {
		let parsed = Account::parse("twitter:7:7_tok_sec").expect("Three fields should suffice.");

		assert_eq!(parsed.email, "");
		assert_eq!(parsed.name, "");
	}
}
