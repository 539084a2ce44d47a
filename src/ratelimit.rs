//! Process-wide rate-limit windows keyed by access token.

// self
use crate::_prelude::*;

/// Fallback window applied when a provider signals throttling without a reset timestamp.
pub const DEFAULT_RATE_LIMIT_WINDOW: Duration = Duration::minutes(15);

/// Registry mapping access tokens to the instant their rate-limit window clears.
///
/// The registry is injected into bindings at construction so tests and
/// multi-tenant processes can scope it; entries are never removed and simply
/// age out once their clearance time is in the past.
#[derive(Debug, Default)]
pub struct RateLimitRegistry(Mutex<HashMap<String, OffsetDateTime>>);
impl RateLimitRegistry {
	/// Returns how long the token remains throttled, or zero when it is clear.
	pub fn remaining(&self, token: &str) -> Duration {
		let guard = self.0.lock();
		let Some(clears_at) = guard.get(token) else { return Duration::ZERO };
		let left = *clears_at - OffsetDateTime::now_utc();

		if left.is_positive() { left } else { Duration::ZERO }
	}

	/// Whether dispatch for this token must be refused right now.
	pub fn is_limited(&self, token: &str) -> bool {
		self.remaining(token).is_positive()
	}

	/// Records a clearance instant for the token.
	///
	/// Updates are monotonic: the check and the insert happen under one lock so
	/// a late-arriving shorter window can never clobber a longer one. Returns
	/// whether the stored clearance actually moved forward.
	pub fn restrict_until(&self, token: &str, clears_at: OffsetDateTime) -> bool {
		let mut guard = self.0.lock();

		match guard.get(token) {
			Some(existing) if *existing >= clears_at => false,
			_ => {
				guard.insert(token.to_owned(), clears_at);

				true
			},
		}
	}

	/// Records a clearance window relative to now.
	pub fn restrict_for(&self, token: &str, window: Duration) -> bool {
		self.restrict_until(token, OffsetDateTime::now_utc() + window)
	}
}
