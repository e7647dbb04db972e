use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::sqlite::snapshot::SnapshotStore;

/// A miniature of the app-store catalog with hand-countable answers:
///
/// - apps with a free plan: 3 (app 3 has both free plans)
/// - categories: Store design 4, Sales and conversion optimization 3,
///   Marketing 2, Inventory management 1
/// - plan prices in [5, 10]: $9.99/month 4, $5/month 2, $10/month 1
const CATALOG: &str = "
    CREATE TABLE apps (id INTEGER PRIMARY KEY, title TEXT NOT NULL);
    CREATE TABLE categories (id INTEGER PRIMARY KEY, title TEXT NOT NULL);
    CREATE TABLE apps_categories (app_id INTEGER NOT NULL, category_id INTEGER NOT NULL);
    CREATE TABLE pricing_plans (id INTEGER PRIMARY KEY, price TEXT NOT NULL);
    CREATE TABLE apps_pricing_plans (app_id INTEGER NOT NULL, pricing_plan_id INTEGER NOT NULL);

    INSERT INTO apps (id, title) VALUES
        (1, 'Oberlo'), (2, 'Privy'), (3, 'Judge.me'),
        (4, 'Bold Upsell'), (5, 'Klaviyo'), (6, 'Stocky');

    INSERT INTO categories (id, title) VALUES
        (1, 'Store design'),
        (2, 'Sales and conversion optimization'),
        (3, 'Marketing'),
        (4, 'Inventory management');

    INSERT INTO apps_categories (app_id, category_id) VALUES
        (1, 1), (2, 1), (3, 1), (4, 1),
        (1, 2), (2, 2), (5, 2),
        (3, 3), (6, 3),
        (6, 4);

    INSERT INTO pricing_plans (id, price) VALUES
        (1, 'Free'), (2, 'Free to install'), (3, '$9.99/month'),
        (4, '$5/month'), (5, '$10/month'), (6, '$19.99/month'), (7, '$4.99/month');

    INSERT INTO apps_pricing_plans (app_id, pricing_plan_id) VALUES
        (1, 1), (1, 3),
        (2, 2), (2, 3),
        (3, 1), (3, 2),
        (4, 3), (4, 4),
        (5, 4), (5, 5), (5, 6),
        (6, 7), (6, 3);
";

/// Writes the catalog to `<dir>/<name>.db`.
pub fn seed_catalog(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(format!("{name}.db"));
    let db = rusqlite::Connection::open(&path).unwrap();
    db.execute_batch(CATALOG).unwrap();
    path
}

/// A temporary store holding the catalog as stage `03`.
pub fn catalog_store() -> (TempDir, SnapshotStore) {
    let dir = tempfile::tempdir().unwrap();
    seed_catalog(dir.path(), "03");
    let store = SnapshotStore::new(dir.path());
    (dir, store)
}
