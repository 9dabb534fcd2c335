const CREATE_USER_TABLE: &str = "CREATE TABLE IF NOT EXISTS user (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT NOT NULL,
  email TEXT UNIQUE,
  is_ghost BOOL NOT NULL DEFAULT FALSE,
  created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
)";

const CREATE_GROUP_TABLE: &str = "CREATE TABLE IF NOT EXISTS expense_group (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT NOT NULL,
  created_by INTEGER NOT NULL REFERENCES user(id),
  created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
)";

const CREATE_GROUP_MEMBER_TABLE: &str = "CREATE TABLE IF NOT EXISTS group_member (
  group_id INTEGER NOT NULL REFERENCES expense_group(id) ON DELETE CASCADE,
  user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
  joined_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
  PRIMARY KEY (group_id, user_id)
)";

const CREATE_EXPENSE_TABLE: &str = "CREATE TABLE IF NOT EXISTS expense (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  group_id INTEGER NOT NULL REFERENCES expense_group(id) ON DELETE CASCADE,
  title TEXT NOT NULL,
  description TEXT,
  amount INTEGER NOT NULL,
  category TEXT NOT NULL DEFAULT 'General',
  created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
)";

const CREATE_EXPENSE_PAYER_TABLE: &str = "CREATE TABLE IF NOT EXISTS expense_payer (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  expense_id INTEGER NOT NULL REFERENCES expense(id) ON DELETE CASCADE,
  user_id INTEGER NOT NULL REFERENCES user(id),
  paid_amount INTEGER NOT NULL
)";

const CREATE_EXPENSE_SPLIT_TABLE: &str = "CREATE TABLE IF NOT EXISTS expense_split (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  expense_id INTEGER NOT NULL REFERENCES expense(id) ON DELETE CASCADE,
  user_id INTEGER NOT NULL REFERENCES user(id),
  amount_owed INTEGER NOT NULL
)";

pub fn create_all_tables(connection: &rusqlite::Connection) -> anyhow::Result<()> {
    // Foreign keys are disabled by default in SQLite and the setting is per connection.
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;
    connection.execute(CREATE_USER_TABLE, ())?;
    connection.execute(CREATE_GROUP_TABLE, ())?;
    connection.execute(CREATE_GROUP_MEMBER_TABLE, ())?;
    connection.execute(CREATE_EXPENSE_TABLE, ())?;
    connection.execute(CREATE_EXPENSE_PAYER_TABLE, ())?;
    connection.execute(CREATE_EXPENSE_SPLIT_TABLE, ())?;
    Ok(())
}
