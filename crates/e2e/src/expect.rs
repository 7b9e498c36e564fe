//! Web-first assertions
//!
//! An assertion polls a point-in-time read of its locator until the
//! condition holds or the timeout elapses. Only the final observation is
//! reported on failure. Driver errors end the polling immediately.

use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::error::{E2eError, E2eResult};
use crate::locator::{Locator, Visibility};

/// Start an assertion on `locator` with the page's expect timeout
pub fn expect(locator: &Locator) -> Expect {
    let timeouts = locator.page().timeouts();
    Expect {
        locator: locator.clone(),
        timeout: timeouts.expect(),
        poll_interval: timeouts.poll_interval(),
        negated: false,
    }
}

#[derive(Debug, Clone)]
pub struct Expect {
    locator: Locator,
    timeout: Duration,
    poll_interval: Duration,
    negated: bool,
}

impl Expect {
    /// Invert the next assertion
    pub fn not(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Exactly one match, and it is visible. Negated: nothing visible.
    pub async fn to_be_visible(&self) -> E2eResult<()> {
        let negated = self.negated;
        self.assert_with(
            "to be visible",
            || self.locator.visibility(),
            move |v: &Visibility| {
                if negated {
                    v.visible == 0
                } else {
                    v.matches == 1 && v.visible == 1
                }
            },
        )
        .await
    }

    /// Nothing visible (absent or hidden). Negated: exactly one visible match.
    pub async fn to_be_hidden(&self) -> E2eResult<()> {
        let negated = self.negated;
        self.assert_with(
            "to be hidden",
            || self.locator.visibility(),
            move |v: &Visibility| {
                if negated {
                    v.matches == 1 && v.visible == 1
                } else {
                    v.visible == 0
                }
            },
        )
        .await
    }

    pub async fn to_have_count(&self, count: usize) -> E2eResult<()> {
        self.assert(
            &format!("to have count {}", count),
            || self.locator.count(),
            move |n: &usize| *n == count,
        )
        .await
    }

    /// Exactly one match whose text equals `text` after whitespace normalization
    pub async fn to_have_text(&self, text: &str) -> E2eResult<()> {
        let expected = normalize_whitespace(text);
        self.assert(
            &format!("to have text {:?}", text),
            || self.locator.inner_texts(),
            move |texts: &Vec<String>| {
                texts.len() == 1 && normalize_whitespace(&texts[0]) == expected
            },
        )
        .await
    }

    /// Exactly one match whose text contains `text`
    pub async fn to_contain_text(&self, text: &str) -> E2eResult<()> {
        let expected = normalize_whitespace(text);
        self.assert(
            &format!("to contain text {:?}", text),
            || self.locator.inner_texts(),
            move |texts: &Vec<String>| {
                texts.len() == 1 && normalize_whitespace(&texts[0]).contains(&expected)
            },
        )
        .await
    }

    /// Computed CSS `property` of the first match equals `value`
    pub async fn to_have_css(&self, property: &str, value: &str) -> E2eResult<()> {
        self.assert(
            &format!("to have CSS {} {:?}", property, value),
            || self.locator.css_value(property),
            move |actual: &Option<String>| actual.as_deref().map(str::trim) == Some(value),
        )
        .await
    }

    pub async fn to_be_checked(&self) -> E2eResult<()> {
        self.assert("to be checked", || self.locator.is_checked(), |checked: &bool| *checked)
            .await
    }

    /// Poll with a predicate that the negation flag inverts
    async fn assert<T, F, Fut, P>(&self, expected: &str, sample: F, pass: P) -> E2eResult<()>
    where
        T: Debug,
        F: FnMut() -> Fut,
        Fut: Future<Output = E2eResult<T>>,
        P: Fn(&T) -> bool,
    {
        let negated = self.negated;
        self.assert_with(expected, sample, move |v: &T| pass(v) != negated)
            .await
    }

    /// Poll with a predicate that already accounts for negation
    async fn assert_with<T, F, Fut, P>(&self, expected: &str, sample: F, pass: P) -> E2eResult<()>
    where
        T: Debug,
        F: FnMut() -> Fut,
        Fut: Future<Output = E2eResult<T>>,
        P: Fn(&T) -> bool,
    {
        match poll_until(self.timeout, self.poll_interval, sample, pass).await? {
            Ok(_) => Ok(()),
            Err(last) => Err(E2eError::AssertionFailed {
                target: self.locator.to_string(),
                expected: if self.negated {
                    format!("not {}", expected)
                } else {
                    expected.to_string()
                },
                actual: format!("{:?} after {:?}", last, self.timeout),
            }),
        }
    }
}

/// Sample until `pass` holds or `timeout` elapses.
///
/// Samples at least once and once more at the deadline. Returns `Ok(Ok(v))`
/// with the passing observation, `Ok(Err(v))` with the last observation on
/// timeout, or the sample's own error.
pub(crate) async fn poll_until<T, F, Fut, P>(
    timeout: Duration,
    interval: Duration,
    mut sample: F,
    pass: P,
) -> E2eResult<Result<T, T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = E2eResult<T>>,
    P: Fn(&T) -> bool,
{
    let deadline = Instant::now() + timeout;
    loop {
        let observed = sample().await?;
        if pass(&observed) {
            return Ok(Ok(observed));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(Err(observed));
        }
        sleep(interval.min(deadline - now)).await;
    }
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testing::{page_with, ScriptedTransport};
    use crate::driver::Command;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_poll_passes_once_condition_holds() {
        let samples = Arc::new(AtomicUsize::new(0));
        let counter = samples.clone();
        let result = poll_until(
            Duration::from_secs(5),
            Duration::from_millis(100),
            || {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                async move { Ok::<_, E2eError>(n) }
            },
            |n| *n == 3,
        )
        .await
        .unwrap();
        assert_eq!(result, Ok(3));
        assert_eq!(samples.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_times_out_with_last_observation() {
        let start = Instant::now();
        let result = poll_until(
            Duration::from_millis(500),
            Duration::from_millis(100),
            || async { Ok::<_, E2eError>("Doing") },
            |text| *text == "Done",
        )
        .await
        .unwrap();
        assert_eq!(result, Err("Doing"));
        assert!(start.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_aborts_on_sample_error() {
        let result = poll_until(
            Duration::from_secs(5),
            Duration::from_millis(100),
            || async { Err::<usize, _>(E2eError::DriverExited) },
            |_| true,
        )
        .await;
        assert!(matches!(result, Err(E2eError::DriverExited)));
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(
            normalize_whitespace("  Text in the\n description   field. "),
            "Text in the description field."
        );
    }

    fn counting_transport(counts: Vec<usize>) -> Arc<ScriptedTransport> {
        let calls = AtomicUsize::new(0);
        ScriptedTransport::new(move |command| match command {
            Command::Count { .. } => {
                let i = calls.fetch_add(1, Ordering::SeqCst).min(counts.len() - 1);
                Ok(json!(counts[i]))
            }
            _ => Ok(Value::Null),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_to_have_count_waits_for_card_to_appear() {
        let page = page_with(counting_transport(vec![3, 3, 4]));
        expect(&page.locator(".list-card")).to_have_count(4).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_to_have_count_failure_reports_last_count() {
        let page = page_with(counting_transport(vec![3]));
        let err = expect(&page.locator(".list"))
            .to_have_count(4)
            .await
            .unwrap_err();
        match err {
            E2eError::AssertionFailed { target, expected, actual } => {
                assert_eq!(target, "locator('.list')");
                assert_eq!(expected, "to have count 4");
                assert!(actual.starts_with("3 after"), "{}", actual);
            }
            other => panic!("expected assertion failure, got {:?}", other),
        }
    }

    fn visibility_transport(matches: usize, visible: usize) -> Arc<ScriptedTransport> {
        ScriptedTransport::new(move |_| Ok(json!({ "matches": matches, "visible": visible })))
    }

    #[tokio::test(start_paused = true)]
    async fn test_to_be_visible_is_strict() {
        let page = page_with(visibility_transport(2, 2));
        let card = page.locator(".list-card");
        assert!(expect(&card).to_be_visible().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_visible_passes_for_missing_element() {
        let page = page_with(visibility_transport(0, 0));
        let card = page.locator(".list-card").filter_has_text("Gone");
        expect(&card).not().to_be_visible().await.unwrap();
        expect(&card).to_be_hidden().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_negated_failure_message() {
        let page = page_with(visibility_transport(1, 1));
        let err = expect(&page.locator("#password-error"))
            .not()
            .to_be_visible()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not to be visible"), "{}", err);
    }

    #[tokio::test(start_paused = true)]
    async fn test_to_have_text_is_exact() {
        let page = page_with(ScriptedTransport::new(|_| {
            Ok(json!(["Text in the description field. Added by Playwright."]))
        }));
        let paragraph = page.locator("div.description-content p");
        expect(&paragraph)
            .to_have_text("Text in the description field.  Added by Playwright.")
            .await
            .unwrap();
        assert!(expect(&paragraph)
            .to_have_text("Text in the description field.")
            .await
            .is_err());
        expect(&paragraph)
            .to_contain_text("Added by Playwright")
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_to_have_css() {
        let page = page_with(ScriptedTransport::new(|_| Ok(json!("rgb(248, 113, 104)"))));
        let chip = page.locator(".card-label");
        expect(&chip)
            .to_have_css("background-color", "rgb(248, 113, 104)")
            .await
            .unwrap();
        assert!(expect(&chip)
            .to_have_css("background-color", "rgb(0, 0, 0)")
            .await
            .is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_timeout_overrides_page_default() {
        let page = page_with(counting_transport(vec![0]));
        let start = Instant::now();
        let result = expect(&page.locator(".list"))
            .with_timeout(Duration::from_secs(3))
            .to_have_count(1)
            .await;
        assert!(result.is_err());
        assert!(start.elapsed() >= Duration::from_secs(3));
    }
}
