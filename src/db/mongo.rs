use mongodb::{
    bson::doc,
    options::{ClientOptions, IndexOptions, ServerApi, ServerApiVersion},
    Client, Collection, IndexModel,
};
use std::sync::Arc;
use std::time::Duration;

use crate::models::{booking::Booking, review::Review, tour::Tour, user::User};

pub const DB_NAME: &str = "Tours";

pub async fn create_mongo_client(uri: &String) -> Arc<Client> {
    println!("Connecting to MongoDB: {}", uri);

    let mut client_options = ClientOptions::parse(uri)
        .await
        .expect("MongoDB URI may be incorrect! Failed to parse.");

    client_options.connect_timeout = Some(Duration::from_secs(10));
    client_options.server_selection_timeout = Some(Duration::from_secs(10));
    client_options.max_pool_size = Some(10);
    client_options.min_pool_size = Some(1);

    let server_api = ServerApi::builder().version(ServerApiVersion::V1).build();
    client_options.server_api = Some(server_api);

    let client =
        Client::with_options(client_options).expect("Failed to create MongoDB client with options");

    match client
        .database(DB_NAME)
        .run_command(doc! {"ping": 1})
        .await
    {
        Ok(_) => println!("Successfully connected to MongoDB and verified with ping command"),
        Err(e) => {
            eprintln!("WARNING: Connected to MongoDB but ping test failed: {}", e);
            eprintln!("The API may still work, but some functionality might be impaired");
        }
    }

    Arc::new(client)
}

pub fn tours(client: &Client) -> Collection<Tour> {
    client.database(DB_NAME).collection("Tours")
}

pub fn users(client: &Client) -> Collection<User> {
    client.database(DB_NAME).collection("Users")
}

pub fn reviews(client: &Client) -> Collection<Review> {
    client.database(DB_NAME).collection("Reviews")
}

pub fn bookings(client: &Client) -> Collection<Booking> {
    client.database(DB_NAME).collection("Bookings")
}

/// One review per (tour, user) is enforced here, not in application code.
pub async fn ensure_indexes(client: &Client) -> mongodb::error::Result<()> {
    let unique = IndexOptions::builder().unique(true).build();

    reviews(client)
        .create_index(
            IndexModel::builder()
                .keys(doc! { "tour": 1, "user": 1 })
                .options(unique.clone())
                .build(),
        )
        .await?;

    users(client)
        .create_index(
            IndexModel::builder()
                .keys(doc! { "email": 1 })
                .options(unique.clone())
                .build(),
        )
        .await?;

    tours(client)
        .create_index(
            IndexModel::builder()
                .keys(doc! { "name": 1 })
                .options(unique.clone())
                .build(),
        )
        .await?;
    tours(client)
        .create_index(
            IndexModel::builder()
                .keys(doc! { "slug": 1 })
                .options(unique)
                .build(),
        )
        .await?;
    tours(client)
        .create_index(
            IndexModel::builder()
                .keys(doc! { "start_location": "2dsphere" })
                .build(),
        )
        .await?;

    bookings(client)
        .create_index(
            IndexModel::builder()
                .keys(doc! { "user": 1, "tour": 1 })
                .build(),
        )
        .await?;

    Ok(())
}
