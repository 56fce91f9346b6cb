use actix_web::{web, App};
use mongodb::options::ClientOptions;
use std::sync::Arc;
use std::time::Duration;

use tours_api::routes;

pub struct TestApp {
    pub client: Arc<mongodb::Client>,
    pub stripe: Arc<stripe::Client>,
}

impl TestApp {
    pub async fn new() -> Self {
        let mongo_uri = std::env::var("MONGODB_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());

        // Short timeouts so tests fail fast when no database is running;
        // none of these tests depend on one.
        let mut options = ClientOptions::parse(&mongo_uri)
            .await
            .expect("Invalid MongoDB URI");
        options.connect_timeout = Some(Duration::from_millis(500));
        options.server_selection_timeout = Some(Duration::from_millis(500));

        let client =
            Arc::new(mongodb::Client::with_options(options).expect("Failed to create client"));
        let stripe = Arc::new(stripe::Client::new("sk_test_dummy".to_string()));

        Self { client, stripe }
    }

    pub fn create_app(
        &self,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(web::Data::new(self.client.clone()))
            .app_data(web::Data::new(self.stripe.clone()))
            .configure(routes::configure)
    }
}
