use aes::cipher::{block_padding::Pkcs7, BlockEncryptMut, KeyIvInit};
use reqwest::ClientBuilder;
use scws::{HttpClient, ServiceConfig};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const KEY: [u8; 16] = u128::to_be_bytes(0xa8cda0ee5390b716298ffad0a1f1a021);
pub const IV: [u8; 16] = u128::to_be_bytes(0xE60C79C314E3C9B471E7E51ABAA0B24A);

pub const MOVIE_ID: u64 = 42;
pub const MOVIE_VIDEO_ID: u64 = 4242;
pub const EPISODE_VIDEO_ID: u64 = 7777;

pub fn encrypt(plain: &[u8]) -> Vec<u8> {
    cbc::Encryptor::<aes::Aes128>::new(&KEY.into(), &IV.into()).encrypt_padded_vec_mut::<Pkcs7>(plain)
}

pub fn segment_data(index: usize) -> Vec<u8> {
    format!("segment #{index:04} ").repeat(index % 7 + 1).into_bytes()
}

/// Entity-encodes a JSON document the way `data-page` attributes are served.
pub fn data_page_html(json: &serde_json::Value) -> String {
    let encoded = json
        .to_string()
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;");
    format!(
        r#"<!DOCTYPE html><html><body><div id="app" data-page="{encoded}"><!-- --></div></body></html>"#
    )
}

pub fn config(server: &MockServer) -> ServiceConfig {
    ServiceConfig::new(&server.uri())
        .unwrap()
        .with_video_host(&server.uri())
        .unwrap()
        .with_key_url(&format!("{}/storage/enc.key", server.uri()))
        .unwrap()
        .with_ip_echo_url(&format!("{}/ip", server.uri()))
        .unwrap()
        .with_content_host("content.example")
}

pub fn client() -> HttpClient {
    HttpClient::new(ClientBuilder::new()).unwrap()
}

pub trait ScwsMock {
    async fn mock<S>(&self, mock_path: &str, body: S) -> &Self
    where
        S: AsRef<str>;

    async fn mock_bytes(&self, mock_path: &str, body: Vec<u8>) -> &Self;

    /// Mounts the watch, iframe, embed and master pages of a title.
    async fn mock_player(&self, watch_json: serde_json::Value) -> &Self;

    /// Mounts a rendition manifest served from `/rendition/42`.
    async fn mock_rendition<S>(&self, body: S) -> &Self
    where
        S: AsRef<str>;
}

impl ScwsMock for MockServer {
    async fn mock<S>(&self, mock_path: &str, body: S) -> &Self
    where
        S: AsRef<str>,
    {
        Mock::given(method("GET"))
            .and(path(mock_path))
            .respond_with(ResponseTemplate::new(200).set_body_string(body.as_ref()))
            .mount(self)
            .await;
        self
    }

    async fn mock_bytes(&self, mock_path: &str, body: Vec<u8>) -> &Self {
        Mock::given(method("GET"))
            .and(path(mock_path))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
            .mount(self)
            .await;
        self
    }

    async fn mock_player(&self, watch_json: serde_json::Value) -> &Self {
        let uri = self.uri();
        self.mock(
            &format!("/watch/{MOVIE_ID}"),
            data_page_html(&watch_json),
        )
        .await
        .mock(
            "/iframe/42",
            format!(
                r#"<html><iframe allowfullscreen src="{uri}/embed/42?token=a&amp;b=1" frameborder="0" width="100%"></iframe></html>"#
            ),
        )
        .await
        .mock(
            "/embed/42",
            format!(
                r#"<html><script>
    window.masterPlaylistParams = {{
        'token': 'page-token',
        'token360p': 't360',
        'token480p': 't480',
        'token720p': 't720',
        'token1080p': '',
        'expires': '1700000000',
        'canCast': 0,
    }}
    const masterPlaylistUrl = new URL('{uri}/playlist/42');
    for (const [key, value] of Object.entries(window.masterPlaylistParams)) {{}}
</script></html>"#
            ),
        )
        .await
        .mock(
            "/playlist/42",
            format!(
                "#EXTM3U
#EXT-X-STREAM-INF:BANDWIDTH=1200000,RESOLUTION=854x480
{uri}/rendition/42?type=video&rendition=480p&token=r480&expires=1700000000
#EXT-X-STREAM-INF:BANDWIDTH=2150000,RESOLUTION=1280x720
{uri}/rendition/43?type=video&rendition=720p&token=r720&expires=1700000000
"
            ),
        )
        .await
    }

    async fn mock_rendition<S>(&self, body: S) -> &Self
    where
        S: AsRef<str>,
    {
        self.mock("/rendition/42", body).await
    }
}

pub fn movie_watch_json(uri: &str) -> serde_json::Value {
    serde_json::json!({
        "component": "Watch",
        "props": {
            "title": { "id": MOVIE_ID, "name": "Movie's Name" },
            "embedUrl": format!("{uri}/iframe/42"),
        }
    })
}

pub fn episode_watch_json(uri: &str) -> serde_json::Value {
    serde_json::json!({
        "component": "Watch",
        "props": {
            "episode": { "id": 11, "scws_id": EPISODE_VIDEO_ID },
            "embedUrl": format!("{uri}/iframe/42"),
        }
    })
}

/// A rendition manifest whose segments are served by the mock server itself.
pub fn absolute_rendition(uri: &str, segments: usize, encrypted: bool) -> String {
    let mut text = String::from("#EXTM3U\n#EXT-X-TARGETDURATION:4\n#EXT-X-PLAYLIST-TYPE:VOD\n");
    if encrypted {
        text.push_str(&format!(
            "#EXT-X-KEY:METHOD=AES-128,URI=\"placeholder\",IV=0x{}\n",
            hex::encode(IV)
        ));
    }
    for i in 0..segments {
        text.push_str(&format!("#EXTINF:4.000000,\n{uri}/seg/0000-{i:04}.ts\n"));
    }
    text.push_str("#EXT-X-ENDLIST\n");
    text
}
