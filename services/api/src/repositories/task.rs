//! Task repository for database operations
//!
//! Every per-task statement filters by `(id, user_id)` jointly, so a
//! task owned by another user is indistinguishable from a task that
//! does not exist.

use common::error::{DatabaseError, DatabaseResult};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::models::{NewTask, SortDirection, Task, TaskFilter, TaskPatch, TaskSort, TaskStats};

const TASK_COLUMNS: &str =
    "id, user_id, title, description, completed, priority, due_date, created_at, updated_at";

/// Task repository
#[derive(Clone)]
pub struct TaskRepository {
    pool: PgPool,
}

impl TaskRepository {
    /// Create a new task repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List a user's tasks with the given filter and ordering.
    ///
    /// The ORDER BY clause is assembled from the allow-listed column
    /// and direction names only; the raw query parameters never reach
    /// the SQL text.
    pub async fn list(
        &self,
        owner_id: i32,
        filter: TaskFilter,
        sort: TaskSort,
        direction: SortDirection,
    ) -> DatabaseResult<Vec<Task>> {
        let mut sql = format!("SELECT {} FROM tasks WHERE user_id = $1", TASK_COLUMNS);
        match filter {
            TaskFilter::Active => sql.push_str(" AND completed = FALSE"),
            TaskFilter::Completed => sql.push_str(" AND completed = TRUE"),
            TaskFilter::All => {}
        }
        sql.push_str(&format!(
            " ORDER BY {} {}",
            sort.column(),
            direction.keyword()
        ));

        let rows = sqlx::query(&sql).bind(owner_id).fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(rows.iter().map(task_from_row).collect())
    }

    /// Create a task for the given owner
    pub async fn create(&self, owner_id: i32, new_task: &NewTask) -> DatabaseResult<Task> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO tasks (user_id, title, description, priority, due_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            TASK_COLUMNS
        ))
        .bind(owner_id)
        .bind(&new_task.title)
        .bind(&new_task.description)
        .bind(new_task.priority)
        .bind(new_task.due_date)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(task_from_row(&row))
    }

    /// Apply a partial update; absent fields keep their current value.
    ///
    /// Returns `None` when no row matches `(task_id, owner_id)`.
    pub async fn update(
        &self,
        task_id: i32,
        owner_id: i32,
        patch: &TaskPatch,
    ) -> DatabaseResult<Option<Task>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE tasks
            SET title = COALESCE($1, title),
                description = COALESCE($2, description),
                completed = COALESCE($3, completed),
                priority = COALESCE($4, priority),
                due_date = COALESCE($5, due_date)
            WHERE id = $6 AND user_id = $7
            RETURNING {}
            "#,
            TASK_COLUMNS
        ))
        .bind(&patch.title)
        .bind(&patch.description)
        .bind(patch.completed)
        .bind(patch.priority)
        .bind(patch.due_date)
        .bind(task_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(row.as_ref().map(task_from_row))
    }

    /// Delete a task; `None` when no row matches `(task_id, owner_id)`
    pub async fn delete(&self, task_id: i32, owner_id: i32) -> DatabaseResult<Option<Task>> {
        let row = sqlx::query(&format!(
            "DELETE FROM tasks WHERE id = $1 AND user_id = $2 RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(task_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(row.as_ref().map(task_from_row))
    }

    /// Set the completion flag; `None` when no row matches
    /// `(task_id, owner_id)`
    pub async fn set_completed(
        &self,
        task_id: i32,
        owner_id: i32,
        completed: bool,
    ) -> DatabaseResult<Option<Task>> {
        let row = sqlx::query(&format!(
            "UPDATE tasks SET completed = $1 WHERE id = $2 AND user_id = $3 RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(completed)
        .bind(task_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(row.as_ref().map(task_from_row))
    }

    /// Count a user's tasks by completion state
    pub async fn stats(&self, owner_id: i32) -> DatabaseResult<TaskStats> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE NOT completed) AS active,
                COUNT(*) FILTER (WHERE completed) AS completed
            FROM tasks
            WHERE user_id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(TaskStats {
            total: row.get("total"),
            active: row.get("active"),
            completed: row.get("completed"),
        })
    }
}

fn task_from_row(row: &PgRow) -> Task {
    Task {
        id: row.get("id"),
        user_id: row.get("user_id"),
        title: row.get("title"),
        description: row.get("description"),
        completed: row.get("completed"),
        priority: row.get("priority"),
        due_date: row.get("due_date"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[cfg(test)]
mod tests {
    //! Repository tests against a live PostgreSQL.
    //!
    //! Run with `DATABASE_URL` pointing at a scratch database:
    //! `cargo test -p api -- --ignored`

    use super::*;
    use crate::repositories::UserRepository;
    use common::database::{DatabaseConfig, init_pool, init_schema};
    use serial_test::serial;

    async fn setup() -> (PgPool, UserRepository, TaskRepository) {
        let config = DatabaseConfig::from_env().expect("database config");
        let pool = init_pool(&config).await.expect("database pool");
        init_schema(&pool).await.expect("schema bootstrap");

        (
            pool.clone(),
            UserRepository::new(pool.clone()),
            TaskRepository::new(pool),
        )
    }

    async fn fresh_user(pool: &PgPool, users: &UserRepository, telegram_id: i64) -> i32 {
        let user = users
            .upsert(telegram_id, Some("Test"), None, None)
            .await
            .expect("upsert user");
        // Start each run from a clean slate for this user
        sqlx::query("DELETE FROM tasks WHERE user_id = $1")
            .bind(user.id)
            .execute(pool)
            .await
            .expect("clear tasks");
        user.id
    }

    fn new_task(title: &str, priority: i32) -> NewTask {
        NewTask {
            title: title.to_string(),
            description: None,
            priority,
            due_date: None,
        }
    }

    #[tokio::test]
    #[serial]
    #[ignore = "requires a PostgreSQL instance"]
    async fn upsert_preserves_internal_id_and_refreshes_names() {
        let (_pool, users, _tasks) = setup().await;

        let first = users
            .upsert(910_001, Some("Alice"), None, Some("alice"))
            .await
            .unwrap();
        let second = users
            .upsert(910_001, Some("Alicia"), Some("Smith"), Some("alice"))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.first_name.as_deref(), Some("Alicia"));
        assert_eq!(second.last_name.as_deref(), Some("Smith"));

        // Both lookups land on the same row
        let by_telegram = users
            .find_by_telegram_id(910_001)
            .await
            .unwrap()
            .expect("user by telegram id");
        assert_eq!(by_telegram.id, first.id);
        assert_eq!(by_telegram.first_name.as_deref(), Some("Alicia"));

        let by_id = users
            .find_by_id(first.id)
            .await
            .unwrap()
            .expect("user by internal id");
        assert_eq!(by_id.telegram_id, 910_001);

        assert!(users.find_by_telegram_id(-1).await.unwrap().is_none());
    }

    #[tokio::test]
    #[serial]
    #[ignore = "requires a PostgreSQL instance"]
    async fn created_task_shows_up_in_listing_and_stats() {
        let (pool, users, tasks) = setup().await;
        let owner = fresh_user(&pool, &users, 910_002).await;

        let task = tasks.create(owner, &new_task("Buy milk", 2)).await.unwrap();
        assert!(!task.completed);
        assert_eq!(task.priority, 2);

        let all = tasks
            .list(owner, TaskFilter::All, TaskSort::Created, SortDirection::Desc)
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "Buy milk");

        let completed = tasks
            .list(
                owner,
                TaskFilter::Completed,
                TaskSort::Created,
                SortDirection::Desc,
            )
            .await
            .unwrap();
        assert!(completed.is_empty());

        let stats = tasks.stats(owner).await.unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.active, 1);
        assert_eq!(stats.completed, 0);

        tasks.set_completed(task.id, owner, true).await.unwrap();
        let stats = tasks.stats(owner).await.unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.active, 0);
        assert_eq!(stats.completed, 1);
    }

    #[tokio::test]
    #[serial]
    #[ignore = "requires a PostgreSQL instance"]
    async fn other_users_tasks_are_invisible_and_immutable() {
        let (pool, users, tasks) = setup().await;
        let alice = fresh_user(&pool, &users, 910_003).await;
        let bob = fresh_user(&pool, &users, 910_004).await;

        let task = tasks.create(alice, &new_task("Secret", 1)).await.unwrap();

        assert!(tasks.update(task.id, bob, &TaskPatch::default()).await.unwrap().is_none());
        assert!(tasks.set_completed(task.id, bob, true).await.unwrap().is_none());
        assert!(tasks.delete(task.id, bob).await.unwrap().is_none());

        // Still present and untouched for the owner
        let listed = tasks
            .list(alice, TaskFilter::All, TaskSort::Created, SortDirection::Desc)
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert!(!listed[0].completed);
    }

    #[tokio::test]
    #[serial]
    #[ignore = "requires a PostgreSQL instance"]
    async fn partial_update_keeps_absent_fields() {
        let (pool, users, tasks) = setup().await;
        let owner = fresh_user(&pool, &users, 910_005).await;

        let created = tasks
            .create(
                owner,
                &NewTask {
                    title: "Write report".to_string(),
                    description: Some("Quarterly numbers".to_string()),
                    priority: 3,
                    due_date: None,
                },
            )
            .await
            .unwrap();

        let patch = TaskPatch {
            priority: Some(1),
            ..TaskPatch::default()
        };
        let updated = tasks.update(created.id, owner, &patch).await.unwrap().unwrap();

        assert_eq!(updated.priority, 1);
        assert_eq!(updated.title, "Write report");
        assert_eq!(updated.description.as_deref(), Some("Quarterly numbers"));
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    #[serial]
    #[ignore = "requires a PostgreSQL instance"]
    async fn hostile_sort_parameters_fall_back_to_default_order() {
        let (pool, users, tasks) = setup().await;
        let owner = fresh_user(&pool, &users, 910_006).await;

        tasks.create(owner, &new_task("first", 1)).await.unwrap();
        tasks.create(owner, &new_task("second", 2)).await.unwrap();

        let listed = tasks
            .list(
                owner,
                TaskFilter::from_param("whatever"),
                TaskSort::from_param("dropTable"),
                SortDirection::from_param("sideways"),
            )
            .await
            .unwrap();

        assert_eq!(listed.len(), 2);
        // created DESC: newest first
        assert_eq!(listed[0].title, "second");
    }
}
