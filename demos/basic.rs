//! Basic example using the in-memory session store

use salvo::prelude::*;
use salvo_sliding_session::{MemoryStore, SessionConfig, SessionDepotExt, SessionHandler};

#[handler]
async fn index(depot: &mut Depot) -> String {
    let session = depot.session_mut().expect("Session not found");

    let notice = session.get::<String>("notice");
    let views: i32 = session.get("views").unwrap_or(0);
    if let Err(e) = session.set("views", views + 1) {
        return format!("Failed to update session: {}", e);
    }

    format!(
        "Hello! You have viewed this page {} time(s).\nSession ID: {}\n{}",
        views + 1,
        session.id(),
        notice.unwrap_or_default()
    )
}

#[handler]
async fn login(req: &mut Request, depot: &mut Depot) -> String {
    let username = req
        .query::<String>("name")
        .unwrap_or_else(|| "anonymous".to_string());

    let session = depot.session_mut().expect("Session not found");
    let saved = session
        .set("user", &username)
        .and_then(|_| session.flash("notice", format!("Welcome back, {}!", username)));
    if let Err(e) = saved {
        return format!("Failed to update session: {}", e);
    }

    // New privileges, new session ID
    depot.rotate_session_key();

    format!("Logged in as: {}", username)
}

#[handler]
async fn whoami(depot: &mut Depot) -> String {
    let session = depot.session_mut().expect("Session not found");

    match session.get::<String>("user") {
        Some(user) => format!("Logged in as: {}", user),
        None => "Not logged in".to_string(),
    }
}

#[handler]
async fn logout(depot: &mut Depot) -> &'static str {
    let session = depot.session_mut().expect("Session not found");
    session.delete_session();
    "Logged out"
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let store = MemoryStore::new();
    let config = SessionConfig::new().with_expire_after(3600);
    let session_handler = SessionHandler::new(store, config);

    let router = Router::new()
        .hoop(session_handler)
        .get(index)
        .push(Router::with_path("login").get(login))
        .push(Router::with_path("whoami").get(whoami))
        .push(Router::with_path("logout").get(logout));

    let acceptor = TcpListener::new("127.0.0.1:5800").bind().await;
    println!("Server running at http://127.0.0.1:5800");
    println!("  GET /                 - View counter (shows flash notices)");
    println!("  GET /login?name=alice - Log in and rotate the session ID");
    println!("  GET /whoami           - Current user");
    println!("  GET /logout           - Delete the session");

    Server::new(acceptor).serve(router).await;
}
