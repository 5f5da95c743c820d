use std::sync::LazyLock;

use mail_campaign::configuration::get_configuration;
use mail_campaign::startup::Application;
use mail_campaign::telemetry::{get_subscriber, init_subscriber};
use wiremock::MockServer;

// Ensure that the `tracing` stack is only initialised once
static TRACING: LazyLock<()> = LazyLock::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    }
});

pub struct TestApp {
    pub address: String,
    /// Stands in for the delivery backend behind `/api/send-email`.
    pub dispatch_server: MockServer,
    pub api_client: reqwest::Client,
}

pub async fn spawn_app() -> TestApp {
    LazyLock::force(&TRACING);

    let dispatch_server = MockServer::start().await;

    let configuration = {
        let mut c = get_configuration().expect("Failed to read configuration.");
        // A random OS port per test app
        c.application.port = 0;
        c.dispatch.base_url = dispatch_server.uri();
        c
    };

    let application = Application::build(configuration)
        .await
        .expect("Failed to build application.");
    let address = format!("http://127.0.0.1:{}", application.port());

    tokio::spawn(application.run_until_stopped());

    TestApp {
        address,
        dispatch_server,
        api_client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub async fn get_campaign(&self) -> serde_json::Value {
        self.api_client
            .get(format!("{}/api/campaign", self.address))
            .send()
            .await
            .expect("Failed to execute request.")
            .json()
            .await
            .expect("Failed to parse the campaign snapshot.")
    }

    pub async fn post_method(&self, method: &str) -> reqwest::Response {
        self.api_client
            .post(format!("{}/api/campaign/method", self.address))
            .json(&serde_json::json!({ "method": method }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_back(&self) -> reqwest::Response {
        self.api_client
            .post(format!("{}/api/campaign/back", self.address))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_advance(&self) -> reqwest::Response {
        self.api_client
            .post(format!("{}/api/campaign/advance", self.address))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn put_content(&self, content: &str) -> reqwest::Response {
        self.api_client
            .put(format!("{}/api/campaign/content", self.address))
            .json(&serde_json::json!({ "content": content }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_recipient(&self, email: &str) -> reqwest::Response {
        self.api_client
            .post(format!("{}/api/campaign/recipients", self.address))
            .json(&serde_json::json!({ "email": email }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_recipient_batch(&self, emails: &[&str]) -> reqwest::Response {
        self.api_client
            .post(format!("{}/api/campaign/recipients/batch", self.address))
            .json(&serde_json::json!({ "emails": emails }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn delete_recipient(&self, index: usize) -> reqwest::Response {
        self.api_client
            .delete(format!("{}/api/campaign/recipients/{}", self.address, index))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn delete_last_recipient(&self) -> reqwest::Response {
        self.api_client
            .delete(format!("{}/api/campaign/recipients/last", self.address))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn import_csv(&self, file_name: &str, body: Vec<u8>) -> reqwest::Response {
        let part = reqwest::multipart::Part::bytes(body)
            .file_name(file_name.to_owned())
            .mime_str("text/csv")
            .expect("Failed to build the multipart file part.");
        let form = reqwest::multipart::Form::new().part("file", part);
        self.api_client
            .post(format!(
                "{}/api/campaign/recipients/import",
                self.address
            ))
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_submit(&self) -> reqwest::Response {
        self.api_client
            .post(format!("{}/api/campaign/submit", self.address))
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

/// A test app already at the recipient collection step.
pub async fn spawn_collecting_app(method: &str) -> TestApp {
    let app = spawn_app().await;
    let response = app.post_method(method).await;
    assert_eq!(200, response.status().as_u16());
    app
}

/// A test app at the composition step with one recipient and some content.
pub async fn spawn_composing_app() -> TestApp {
    let app = spawn_collecting_app("manual").await;
    assert_eq!(200, app.post_recipient("a@b.com").await.status().as_u16());
    assert_eq!(200, app.post_advance().await.status().as_u16());
    assert_eq!(
        200,
        app.put_content("hello there").await.status().as_u16()
    );
    app
}
