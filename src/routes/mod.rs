use rocket::request::{FromRequest, Outcome, Request};

pub mod admin;
pub mod api;
pub mod auth;
pub mod public;

/// Request metadata recorded on contact submissions. Never fails; absent
/// values degrade to empty strings.
pub struct ClientMeta {
    pub ip: String,
    pub user_agent: String,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for ClientMeta {
    type Error = std::convert::Infallible;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let ip = request
            .client_ip()
            .map(|ip| ip.to_string())
            .unwrap_or_default();
        let user_agent = request
            .headers()
            .get_one("User-Agent")
            .unwrap_or_default()
            .chars()
            .take(255)
            .collect();
        Outcome::Success(ClientMeta { ip, user_agent })
    }
}

/// Current page (floored at 1) and the store skip for it. Saturating so
/// absurd page values from the query string cannot overflow.
pub(crate) fn page_skip(page: Option<usize>, per_page: usize) -> (usize, u64) {
    let current = page.unwrap_or(1).max(1);
    let skip = current.saturating_sub(1).saturating_mul(per_page) as u64;
    (current, skip)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_skip_basics() {
        assert_eq!(page_skip(None, 9), (1, 0));
        assert_eq!(page_skip(Some(0), 9), (1, 0));
        assert_eq!(page_skip(Some(3), 9), (3, 18));
    }

    #[test]
    fn page_skip_saturates_on_huge_page_numbers() {
        let (current, skip) = page_skip(Some(usize::MAX), 9);
        assert_eq!(current, usize::MAX);
        assert_eq!(skip, u64::MAX);

        let (_, skip) = page_skip(Some(usize::MAX), 10);
        assert_eq!(skip, u64::MAX);
    }
}
