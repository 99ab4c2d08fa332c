//! Official-account publisher.
//!
//! Every operation starts by fetching an access token with the app
//! credentials. A draft is then added as a one-article draft; when the draft
//! call fails the article is created once more as a permanent news material
//! instead. Articles can also be created as permanent material directly,
//! images can be uploaded as permanent or temporary material, and an article
//! body can be laid out by a language model before it is drafted.
//!
//! A cover is given either as a media id or as a local image path
//! (`.jpg`, `.jpeg`, `.png`, `.gif`, `.bmp`); paths are uploaded as permanent
//! material first.

use crate::api::{ChatCompletion, ChatMessage};
use crate::config::WechatConfig;
use crate::error::PublishError;
use crate::publish::{PlatformReply, PublishReport, Publisher};
use crate::utils::mask_secret;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

const IMAGE_EXTENSIONS: [&str; 5] = [".jpg", ".jpeg", ".png", ".gif", ".bmp"];

const LAYOUT_PROMPT: &str = "- 将上述内容使用 html 渲染出来
- 符合微信公众号风格，样式颜色合理，边框合理
- 该用标题的使用标题，该使用列表的使用列表，该使用段落的使用段落
- 有超级链接的加上链接，点击可以跳转
- 使用 section 进行布局，样式现代，科技感十足
- 返回结构如下：
```html
<section>
    <p>文章内容</p>
</section>
```";

/// Article fields supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct DraftArticle {
    pub title: String,
    pub author: String,
    pub content: String,
    /// Summary shown in the article card; the platform derives one when empty.
    pub digest: String,
    pub content_source_url: String,
    /// Cover as a media id or a local image path. Falls back to the
    /// configured cover when unset or empty.
    pub thumb: Option<String>,
}

#[derive(Debug, Serialize)]
struct ArticlePayload<'a> {
    title: &'a str,
    author: &'a str,
    digest: &'a str,
    content: &'a str,
    content_source_url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    thumb_media_id: Option<&'a str>,
    show_cover_pic: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    need_open_comment: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    only_fans_can_comment: Option<u8>,
}

#[derive(Debug, Serialize)]
struct Articles<'a> {
    articles: [ArticlePayload<'a>; 1],
}

/// Publishes articles to an official account through its HTTP API.
///
/// Holds the app credentials and article defaults from [`WechatConfig`]. A
/// fresh access token is fetched for every public operation.
pub struct WechatDraftPublisher {
    client: reqwest::Client,
    config: WechatConfig,
}

impl WechatDraftPublisher {
    /// Create a publisher.
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client.
    /// * `config` - Credentials, API base URL, default cover and comment flags.
    pub fn new(client: reqwest::Client, config: WechatConfig) -> Self {
        Self { client, config }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/cgi-bin/{path}", self.config.api_base.trim_end_matches('/'))
    }

    #[instrument(level = "info", skip_all, fields(app_id = %mask_secret(&self.config.app_id)))]
    async fn access_token(&self) -> Result<String, PublishError> {
        if !self.config.is_configured() {
            return Err(PublishError::NotConfigured(
                "WECHAT_APP_ID / WECHAT_APP_SECRET".to_string(),
            ));
        }
        let reply: PlatformReply = self
            .client
            .get(self.endpoint("token"))
            .query(&[
                ("grant_type", "client_credential"),
                ("appid", self.config.app_id.as_str()),
                ("secret", self.config.app_secret.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        reply
            .into_result()?
            .access_token
            .ok_or_else(|| PublishError::Api {
                errcode: -1,
                errmsg: "token reply without access_token".to_string(),
            })
    }

    async fn post_articles(
        &self,
        path: &str,
        token: &str,
        body: &Articles<'_>,
    ) -> Result<String, PublishError> {
        let reply: PlatformReply = self
            .client
            .post(self.endpoint(path))
            .query(&[("access_token", token)])
            .json(body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        reply.into_result()?.media_id.ok_or_else(|| PublishError::Api {
            errcode: -1,
            errmsg: format!("{path} reply without media_id"),
        })
    }

    async fn upload_with_token(
        &self,
        token: &str,
        path: &Path,
        permanent: bool,
    ) -> Result<String, PublishError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| PublishError::Image {
            path: path.display().to_string(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let form = Form::new().part("media", Part::bytes(bytes).file_name(file_name));
        let api = if permanent {
            "material/add_material"
        } else {
            "media/upload"
        };

        let reply: PlatformReply = self
            .client
            .post(self.endpoint(api))
            .query(&[("access_token", token), ("type", "image")])
            .multipart(form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let media_id = reply.into_result()?.media_id.ok_or_else(|| PublishError::Api {
            errcode: -1,
            errmsg: format!("{api} reply without media_id"),
        })?;
        info!(%media_id, permanent, "Image uploaded");
        Ok(media_id)
    }

    /// Upload an image and return its media id.
    ///
    /// Permanent images can be used as article covers; temporary ones expire
    /// on the platform side after three days.
    #[instrument(level = "info", skip(self), fields(path = %path.display()))]
    pub async fn upload_image(&self, path: &Path, permanent: bool) -> Result<String, PublishError> {
        let token = self.access_token().await?;
        self.upload_with_token(&token, path, permanent).await
    }

    /// Turn a caller-supplied cover into a media id.
    ///
    /// An image path that does not exist leaves the article without a cover.
    async fn resolve_thumb(
        &self,
        token: &str,
        thumb: Option<&str>,
    ) -> Result<Option<String>, PublishError> {
        let Some(thumb) = thumb.map(str::trim).filter(|t| !t.is_empty()) else {
            return Ok(self
                .config
                .thumb_media_id
                .clone()
                .filter(|t| !t.is_empty()));
        };
        if !is_image_path(thumb) {
            debug!(media_id = %thumb, "Using cover media id");
            return Ok(Some(thumb.to_string()));
        }
        let path = Path::new(thumb);
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            warn!(path = %thumb, "Cover image not found; article gets no cover");
            return Ok(None);
        }
        self.upload_with_token(token, path, true).await.map(Some)
    }

    fn payload<'a>(
        &self,
        article: &'a DraftArticle,
        thumb: Option<&'a str>,
        with_comment_flags: bool,
    ) -> ArticlePayload<'a> {
        ArticlePayload {
            title: &article.title,
            author: &article.author,
            digest: &article.digest,
            content: &article.content,
            content_source_url: &article.content_source_url,
            thumb_media_id: thumb,
            show_cover_pic: self.config.show_cover_pic,
            need_open_comment: with_comment_flags.then_some(self.config.need_open_comment),
            only_fans_can_comment: with_comment_flags.then_some(self.config.only_fans_can_comment),
        }
    }

    /// Create a draft and return its media id.
    ///
    /// # Errors
    ///
    /// Fails when the credentials are missing, the token call fails, a cover
    /// image cannot be uploaded, or both the draft call and the
    /// permanent-material fallback fail.
    #[instrument(level = "info", skip_all, fields(title = %article.title))]
    pub async fn create_draft(&self, article: &DraftArticle) -> Result<String, PublishError> {
        let token = self.access_token().await?;
        let thumb = self.resolve_thumb(&token, article.thumb.as_deref()).await?;

        let draft = Articles {
            articles: [self.payload(article, thumb.as_deref(), true)],
        };
        match self.post_articles("draft/add", &token, &draft).await {
            Ok(media_id) => {
                info!(%media_id, "Draft created");
                Ok(media_id)
            }
            Err(e) => {
                warn!(error = %e, "Draft call failed; creating permanent news material");
                let material = Articles {
                    articles: [self.payload(article, thumb.as_deref(), false)],
                };
                let media_id = self.post_articles("material/add_news", &token, &material).await?;
                info!(%media_id, "Permanent news material created");
                Ok(media_id)
            }
        }
    }

    /// Create the article as permanent news material, skipping drafts.
    #[instrument(level = "info", skip_all, fields(title = %article.title))]
    pub async fn publish_permanent(&self, article: &DraftArticle) -> Result<String, PublishError> {
        let token = self.access_token().await?;
        let thumb = self.resolve_thumb(&token, article.thumb.as_deref()).await?;
        let material = Articles {
            articles: [self.payload(article, thumb.as_deref(), false)],
        };
        let media_id = self.post_articles("material/add_news", &token, &material).await?;
        info!(%media_id, "Permanent news material created");
        Ok(media_id)
    }

    /// Lay out `raw` as article HTML with a language model, then draft it.
    ///
    /// # Arguments
    ///
    /// * `chat` - Model that writes the HTML.
    /// * `raw` - Plain text to lay out.
    /// * `article` - Everything but the body; its `content` is replaced.
    ///
    /// # Errors
    ///
    /// [`PublishError::Llm`] when the model call fails and
    /// [`PublishError::MissingHtml`] when the reply holds no fenced html
    /// block. No draft is created in either case.
    #[instrument(level = "info", skip_all, fields(title = %article.title))]
    pub async fn generate(
        &self,
        chat: &dyn ChatCompletion,
        raw: &str,
        article: DraftArticle,
    ) -> Result<String, PublishError> {
        let messages = [
            ChatMessage::system("你是一个有用的助手"),
            ChatMessage::user(format!("{raw}\n{LAYOUT_PROMPT}")),
        ];
        let reply = chat.complete(&messages, None).await?;
        let content = extract_html_block(&reply).ok_or(PublishError::MissingHtml)?;
        debug!(bytes = content.len(), "Generated article body");
        self.create_draft(&DraftArticle {
            content: content.to_string(),
            ..article
        })
        .await
    }
}

fn is_image_path(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Body of the first ```` ```html ```` fence, trimmed. An unclosed fence runs
/// to the end of the reply.
fn extract_html_block(reply: &str) -> Option<&str> {
    let (_, rest) = reply.split_once("```html")?;
    let body = rest.split_once("```").map_or(rest, |(inner, _)| inner).trim();
    (!body.is_empty()).then_some(body)
}

#[async_trait]
impl Publisher for WechatDraftPublisher {
    fn name(&self) -> &'static str {
        "wechat"
    }

    async fn publish(
        &self,
        body: &str,
        title: &str,
        author: &str,
    ) -> Result<PublishReport, PublishError> {
        let article = DraftArticle {
            title: title.to_string(),
            author: author.to_string(),
            content: body.to_string(),
            ..DraftArticle::default()
        };
        let media_id = self.create_draft(&article).await?;
        let mut report = PublishReport::new(self.name());
        report.delivered("official-account draft", Some(media_id));
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use std::path::PathBuf;
    use wiremock::matchers::{body_partial_json, body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> WechatConfig {
        WechatConfig {
            app_id: "wx-app".to_string(),
            app_secret: "wx-secret".to_string(),
            thumb_media_id: Some("cover-1".to_string()),
            api_base: server.uri(),
            ..WechatConfig::default()
        }
    }

    async fn mount_token(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/cgi-bin/token"))
            .and(query_param("appid", "wx-app"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"access_token": "tok", "expires_in": 7200})),
            )
            .mount(server)
            .await;
    }

    async fn write_image(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("digest-wechat-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let file = dir.join(name);
        tokio::fs::write(&file, b"fake-image-bytes").await.unwrap();
        file
    }

    /// Body of the single article sent to `api`.
    async fn sent_article(server: &MockServer, api: &str) -> serde_json::Value {
        let requests = server.received_requests().await.unwrap();
        let request = requests
            .iter()
            .find(|r| r.url.path() == api)
            .unwrap_or_else(|| panic!("no request to {api}"));
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        body["articles"][0].clone()
    }

    struct Canned(&'static str);

    #[async_trait]
    impl ChatCompletion for Canned {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            _temperature: Option<f32>,
        ) -> Result<String, LlmError> {
            assert!(messages[1].content.starts_with("最新模型: Qwen3"));
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn test_draft_created() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("POST"))
            .and(path("/cgi-bin/draft/add"))
            .and(query_param("access_token", "tok"))
            .and(body_partial_json(serde_json::json!({
                "articles": [{"title": "每日AI资讯精华", "thumb_media_id": "cover-1", "need_open_comment": 0}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"media_id": "draft-9"})))
            .expect(1)
            .mount(&server)
            .await;

        let publisher = WechatDraftPublisher::new(reqwest::Client::new(), config(&server));
        let report = publisher
            .publish("<section>body</section>", "每日AI资讯精华", "AI小助手")
            .await
            .unwrap();
        assert_eq!(report.delivered_count(), 1);
        assert_eq!(
            report.outcomes[0],
            crate::publish::DestinationOutcome::Delivered {
                destination: "official-account draft".to_string(),
                id: Some("draft-9".to_string())
            }
        );
    }

    #[tokio::test]
    async fn test_empty_explicit_thumb_uses_configured_cover() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("POST"))
            .and(path("/cgi-bin/draft/add"))
            .and(body_partial_json(serde_json::json!({
                "articles": [{"thumb_media_id": "cover-1"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"media_id": "draft-1"})))
            .expect(1)
            .mount(&server)
            .await;

        let publisher = WechatDraftPublisher::new(reqwest::Client::new(), config(&server));
        let media_id = publisher
            .create_draft(&DraftArticle {
                title: "t".to_string(),
                thumb: Some(String::new()),
                ..DraftArticle::default()
            })
            .await
            .unwrap();
        assert_eq!(media_id, "draft-1");
    }

    #[tokio::test]
    async fn test_explicit_media_id_wins_over_configured_cover() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("POST"))
            .and(path("/cgi-bin/draft/add"))
            .and(body_partial_json(serde_json::json!({
                "articles": [{"thumb_media_id": "MvcyvW-8y3M9"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"media_id": "draft-2"})))
            .expect(1)
            .mount(&server)
            .await;

        let publisher = WechatDraftPublisher::new(reqwest::Client::new(), config(&server));
        let article = DraftArticle {
            thumb: Some("MvcyvW-8y3M9".to_string()),
            ..DraftArticle::default()
        };
        assert_eq!(publisher.create_draft(&article).await.unwrap(), "draft-2");
    }

    #[tokio::test]
    async fn test_image_path_thumb_is_uploaded_first() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("POST"))
            .and(path("/cgi-bin/material/add_material"))
            .and(query_param("type", "image"))
            .and(body_string_contains("filename=\"cover.PNG\""))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"media_id": "img-7", "url": "http://mmbiz/x"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/cgi-bin/draft/add"))
            .and(body_partial_json(serde_json::json!({
                "articles": [{"thumb_media_id": "img-7"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"media_id": "draft-3"})))
            .expect(1)
            .mount(&server)
            .await;

        let image = write_image("cover.PNG").await;
        let publisher = WechatDraftPublisher::new(reqwest::Client::new(), config(&server));
        let article = DraftArticle {
            thumb: Some(image.display().to_string()),
            ..DraftArticle::default()
        };
        assert_eq!(publisher.create_draft(&article).await.unwrap(), "draft-3");
    }

    #[tokio::test]
    async fn test_missing_image_path_leaves_article_without_cover() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("POST"))
            .and(path("/cgi-bin/draft/add"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"media_id": "draft-4"})))
            .expect(1)
            .mount(&server)
            .await;

        let publisher = WechatDraftPublisher::new(reqwest::Client::new(), config(&server));
        let article = DraftArticle {
            thumb: Some("/no/such/dir/cover.jpg".to_string()),
            ..DraftArticle::default()
        };
        assert_eq!(publisher.create_draft(&article).await.unwrap(), "draft-4");
        let sent = sent_article(&server, "/cgi-bin/draft/add").await;
        assert!(sent.get("thumb_media_id").is_none());
    }

    #[tokio::test]
    async fn test_upload_permanent_and_temporary() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("POST"))
            .and(path("/cgi-bin/material/add_material"))
            .and(query_param("access_token", "tok"))
            .and(body_string_contains("name=\"media\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"media_id": "perm-1"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/cgi-bin/media/upload"))
            .and(query_param("type", "image"))
            .and(body_string_contains("fake-image-bytes"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"type": "image", "media_id": "tmp-1", "created_at": 1})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let image = write_image("upload.jpg").await;
        let publisher = WechatDraftPublisher::new(reqwest::Client::new(), config(&server));
        assert_eq!(publisher.upload_image(&image, true).await.unwrap(), "perm-1");
        assert_eq!(publisher.upload_image(&image, false).await.unwrap(), "tmp-1");
    }

    #[tokio::test]
    async fn test_upload_unreadable_file() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        let publisher = WechatDraftPublisher::new(reqwest::Client::new(), config(&server));
        let err = publisher
            .upload_image(Path::new("/no/such/file.png"), true)
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::Image { .. }));
    }

    #[tokio::test]
    async fn test_publish_permanent_skips_draft() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("POST"))
            .and(path("/cgi-bin/draft/add"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"media_id": "x"})))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/cgi-bin/material/add_news"))
            .and(body_partial_json(serde_json::json!({
                "articles": [{"title": "t", "thumb_media_id": "cover-1", "show_cover_pic": 1}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"media_id": "news-8"})))
            .expect(1)
            .mount(&server)
            .await;

        let publisher = WechatDraftPublisher::new(reqwest::Client::new(), config(&server));
        let article = DraftArticle {
            title: "t".to_string(),
            ..DraftArticle::default()
        };
        assert_eq!(publisher.publish_permanent(&article).await.unwrap(), "news-8");
        let sent = sent_article(&server, "/cgi-bin/material/add_news").await;
        assert!(sent.get("need_open_comment").is_none());
    }

    #[tokio::test]
    async fn test_generate_drafts_extracted_html() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("POST"))
            .and(path("/cgi-bin/draft/add"))
            .and(body_partial_json(serde_json::json!({
                "articles": [{"title": "每日AI资讯精华", "content": "<section><p>Qwen3</p></section>"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"media_id": "draft-5"})))
            .expect(1)
            .mount(&server)
            .await;

        let publisher = WechatDraftPublisher::new(reqwest::Client::new(), config(&server));
        let chat = Canned("好的：\n```html\n<section><p>Qwen3</p></section>\n```\n希望有帮助");
        let article = DraftArticle {
            title: "每日AI资讯精华".to_string(),
            content: "replaced".to_string(),
            ..DraftArticle::default()
        };
        let media_id = publisher
            .generate(&chat, "最新模型: Qwen3-VL-8B-Thinking", article)
            .await
            .unwrap();
        assert_eq!(media_id, "draft-5");
    }

    #[tokio::test]
    async fn test_generate_without_html_block_creates_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cgi-bin/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"access_token": "tok"})))
            .expect(0)
            .mount(&server)
            .await;

        let publisher = WechatDraftPublisher::new(reqwest::Client::new(), config(&server));
        let err = publisher
            .generate(&Canned("<p>no fence</p>"), "最新模型: Qwen3", DraftArticle::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::MissingHtml));
    }

    #[test]
    fn test_extract_html_block() {
        assert_eq!(extract_html_block("a```html\n<p>x</p>\n```b"), Some("<p>x</p>"));
        assert_eq!(extract_html_block("```html\n<p>open</p>"), Some("<p>open</p>"));
        assert_eq!(extract_html_block("```html\n\n```"), None);
        assert_eq!(extract_html_block("<p>x</p>"), None);
    }

    #[test]
    fn test_is_image_path() {
        assert!(is_image_path("cover.jpeg"));
        assert!(is_image_path("/tmp/Cover.BMP"));
        assert!(!is_image_path("MvcyvW-8y3M9zOIu1qlEL"));
        assert!(!is_image_path("notes.txt"));
    }

    #[tokio::test]
    async fn test_falls_back_to_permanent_material() {
        let server = MockServer::start().await;
        mount_token(&server).await;
        Mock::given(method("POST"))
            .and(path("/cgi-bin/draft/add"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"errcode": 48001, "errmsg": "api unauthorized"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/cgi-bin/material/add_news"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"media_id": "news-3"})))
            .expect(1)
            .mount(&server)
            .await;

        let publisher = WechatDraftPublisher::new(reqwest::Client::new(), config(&server));
        let media_id = publisher
            .create_draft(&DraftArticle {
                title: "t".to_string(),
                content: "c".to_string(),
                ..DraftArticle::default()
            })
            .await
            .unwrap();
        assert_eq!(media_id, "news-3");
    }

    #[tokio::test]
    async fn test_token_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cgi-bin/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"errcode": 40013, "errmsg": "invalid appid"})),
            )
            .mount(&server)
            .await;

        let publisher = WechatDraftPublisher::new(reqwest::Client::new(), config(&server));
        let err = publisher.publish("b", "t", "a").await.unwrap_err();
        assert!(matches!(err, PublishError::Api { errcode: 40013, .. }));
    }

    #[tokio::test]
    async fn test_missing_credentials() {
        let publisher = WechatDraftPublisher::new(reqwest::Client::new(), WechatConfig::default());
        let err = publisher.publish("b", "t", "a").await.unwrap_err();
        assert!(matches!(err, PublishError::NotConfigured(_)));
    }

    #[test]
    fn test_material_payload_omits_comment_flags() {
        let publisher = WechatDraftPublisher::new(reqwest::Client::new(), WechatConfig::default());
        let article = DraftArticle {
            title: "t".to_string(),
            ..DraftArticle::default()
        };
        let value = serde_json::to_value(publisher.payload(&article, None, false)).unwrap();
        assert!(value.get("need_open_comment").is_none());
        assert!(value.get("thumb_media_id").is_none());
        assert_eq!(value["show_cover_pic"], 1);

        let draft = serde_json::to_value(publisher.payload(&article, Some("m"), true)).unwrap();
        assert_eq!(draft["need_open_comment"], 0);
        assert_eq!(draft["thumb_media_id"], "m");
    }
}
