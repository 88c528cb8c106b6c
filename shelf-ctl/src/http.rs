use anyhow::Context;
use async_trait::async_trait;
use reqwest::{header, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde_json::Value;
use shelf_api::{
    AuthToken, BookDetail, BookId, CommentService, Endpoint, Envelope, Error, NewComment,
    ServerId, ENVELOPE_CREATED, ENVELOPE_NO_CONTENT,
};

const MAX_RETRIES: u32 = 3;

lazy_static::lazy_static! {
    static ref CLIENT: ClientWithMiddleware = {
        let policy = ExponentialBackoff::builder().build_with_max_retries(MAX_RETRIES);
        ClientBuilder::new(reqwest::Client::new())
            .with(RetryTransientMiddleware::new_with_policy(policy))
            .build()
    };

    static ref SINGLE_SHOT_CLIENT: ClientWithMiddleware =
        ClientBuilder::new(reqwest::Client::new()).build();
}

/// Writes and likes are not idempotent (a like toggles), so a transient
/// failure on them is reported instead of replayed
fn client_for(endpoint: Endpoint) -> &'static ClientWithMiddleware {
    match endpoint {
        Endpoint::Delete => &*CLIENT,
        Endpoint::Write | Endpoint::Like => &*SINGLE_SHOT_CLIENT,
    }
}

/// Body of a 2xx write answer, refused when it is an envelope with another
/// status than `CREATED`
fn written(body: &[u8]) -> Result<Value, Error> {
    if body.is_empty() {
        return Ok(Value::Null);
    }
    let Ok(value) = serde_json::from_slice::<Value>(body) else {
        // a body we can't parse still means the comment was written
        return Ok(Value::String(String::from_utf8_lossy(body).into_owned()));
    };
    match value.get("status").and_then(Value::as_str) {
        Some(status) if status != ENVELOPE_CREATED => {
            tracing::warn!(status, "write answered with a non-created envelope");
            Err(Error::Unknown(Error::message_of(body)))
        }
        _ => Ok(value),
    }
}

/// The book API, reached over HTTP as the member owning `token`
pub struct HttpCommentService {
    host: String,
    token: AuthToken,
}

impl HttpCommentService {
    pub fn new(host: String, token: AuthToken) -> HttpCommentService {
        HttpCommentService {
            host: String::from(host.trim_end_matches('/')),
            token,
        }
    }

    fn request(&self, endpoint: Endpoint) -> RequestBuilder {
        client_for(endpoint)
            .request(endpoint.method(), format!("{}{}", self.host, endpoint.path()))
            .bearer_auth(self.token.0)
    }

    /// Sends `req`, returning the body of 2xx answers and the classified error
    /// of everything else
    async fn call(&self, endpoint: Endpoint, req: RequestBuilder) -> Result<Vec<u8>, Error> {
        let resp = match req.send().await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::error!(%endpoint, "failed to reach the book api: {:?}", e);
                return Err(Error::Unknown(None));
            }
        };
        let status = resp.status();
        let body = match resp.bytes().await {
            Ok(body) => body.to_vec(),
            Err(e) => {
                tracing::error!(%endpoint, %status, "failed to read response body: {:?}", e);
                return Err(Error::Unknown(None));
            }
        };
        if !status.is_success() {
            tracing::debug!(%endpoint, %status, "book api refused the request");
            return Err(Error::from_response(endpoint, status, &body));
        }
        if status != endpoint.success_status() {
            tracing::debug!(%endpoint, %status, "unexpected success status");
        }
        Ok(body)
    }

    pub async fn fetch_book(&self, book: BookId) -> anyhow::Result<BookDetail> {
        let resp = CLIENT
            .get(format!("{}/api/book/detail", self.host))
            .query(&[("bookId", book.0)])
            .bearer_auth(self.token.0)
            .send()
            .await
            .with_context(|| format!("fetching details of book {book}"))?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            anyhow::bail!("book {book} does not exist");
        }
        let body = resp
            .error_for_status()
            .with_context(|| format!("fetching details of book {book}"))?
            .bytes()
            .await
            .context("reading book details")?;
        let detail: Envelope<BookDetail> =
            serde_json::from_slice(&body).context("parsing book details")?;
        Ok(detail.data)
    }
}

#[async_trait]
impl CommentService for HttpCommentService {
    async fn write_comment(&self, book: BookId, text: &str) -> Result<Value, Error> {
        let body = serde_json::to_vec(&NewComment {
            chat: String::from(text),
        })
        .map_err(|e| Error::Unknown(Some(e.to_string())))?;
        let req = self
            .request(Endpoint::Write)
            .query(&[("bookId", book.0)])
            .header(header::CONTENT_TYPE, "application/json")
            .body(body);
        let body = self.call(Endpoint::Write, req).await?;
        written(&body)
    }

    async fn like_comment(&self, comment: &ServerId) -> Result<bool, Error> {
        let req = self
            .request(Endpoint::Like)
            .query(&[("commentId", comment.to_string())]);
        let body = self.call(Endpoint::Like, req).await?;
        match serde_json::from_slice::<Envelope<bool>>(&body) {
            Ok(env) => Ok(env.has_status(ENVELOPE_CREATED) && env.data),
            Err(e) => {
                tracing::warn!(%comment, "like answer is not understood: {:?}", e);
                Err(Error::Unknown(Error::message_of(&body)))
            }
        }
    }

    async fn delete_comment(&self, comment: &ServerId) -> Result<(), Error> {
        let req = self
            .request(Endpoint::Delete)
            .query(&[("commentId", comment.to_string())]);
        let body = self.call(Endpoint::Delete, req).await?;
        if let Ok(env) = serde_json::from_slice::<Envelope<Value>>(&body) {
            if !env.has_status(ENVELOPE_NO_CONTENT) {
                tracing::debug!(%comment, status = %env.status, "delete answered with another status");
            }
        }
        Ok(())
    }
}
