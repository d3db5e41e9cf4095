use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use adaptive_practice::domain::Subject;
use adaptive_practice::{config, db, AdaptiveEngine, SqliteStore};

fn main() -> ExitCode {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "adaptive_practice=debug".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  let db_path = config::load_database_path();
  let pool = match db::init_db(&db_path) {
    Ok(pool) => pool,
    Err(e) => {
      tracing::error!("Failed to initialize database at {}: {}", db_path.display(), e);
      return ExitCode::FAILURE;
    }
  };

  let subject_id = config::load_subject();
  let subject = match Subject::new(&subject_id) {
    Ok(subject) => subject,
    Err(e) => {
      tracing::error!("{}", e);
      return ExitCode::FAILURE;
    }
  };
  tracing::info!("Schema ready for subject '{}'", subject);

  // Optional report: <user_id> <topic_id>
  let args: Vec<String> = std::env::args().skip(1).collect();
  let (user_id, topic_id) = match args.as_slice() {
    [] => return ExitCode::SUCCESS,
    [user, topic] => match topic.parse::<i64>() {
      Ok(topic_id) => (user.clone(), topic_id),
      Err(_) => {
        eprintln!("topic id must be an integer, got {:?}", topic);
        return ExitCode::FAILURE;
      }
    },
    _ => {
      eprintln!("usage: adaptive_practice [<user_id> <topic_id>]");
      return ExitCode::FAILURE;
    }
  };

  let engine = AdaptiveEngine::new(SqliteStore::new(pool, subject));
  let report = engine
    .get_adaptive_learning_recommendations(&user_id, topic_id)
    .map_err(|e| e.to_string())
    .and_then(|recs| serde_json::to_string_pretty(&recs).map_err(|e| e.to_string()));

  match report {
    Ok(json) => {
      println!("{}", json);
      ExitCode::SUCCESS
    }
    Err(e) => {
      tracing::error!("Failed to build recommendations: {}", e);
      ExitCode::FAILURE
    }
  }
}
