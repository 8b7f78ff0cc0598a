/// Recurring task materialization
///
/// Each pass loads recurring tasks whose `next_recurring_date` has
/// arrived and, for each one, inserts a fresh `todo` copy (title,
/// description, priority, assignee, creator, tags, and the recurrence
/// itself carried over) and advances `next_recurring_date` on both rows.
///
/// A failure on one task is logged and skipped; the pass continues with
/// the rest, and the loop continues with the next tick. A task that
/// failed keeps its old `next_recurring_date` and is retried next pass.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use taskdeck_shared::models::task::{NewTask, Task, TaskStatus};

/// How many due tasks one pass will process
const BATCH_LIMIT: i64 = 500;

/// Runs one scheduler pass; returns the number of tasks materialized
pub async fn run_pass(pool: &PgPool, now: DateTime<Utc>) -> Result<usize, sqlx::Error> {
    let due = Task::list_due_recurring(pool, now, BATCH_LIMIT).await?;

    if due.is_empty() {
        tracing::debug!("No recurring tasks due");
        return Ok(0);
    }

    tracing::info!(count = due.len(), "Materializing recurring tasks");

    let mut spawned = 0;
    for task in due {
        match materialize(pool, &task).await {
            Ok(()) => spawned += 1,
            Err(e) => {
                tracing::error!(task_id = %task.id, "Failed to materialize recurring task: {}", e);
            }
        }
    }

    Ok(spawned)
}

/// Clones one due recurring task and advances both rows
async fn materialize(pool: &PgPool, task: &Task) -> Result<(), sqlx::Error> {
    // list_due_recurring only returns rows with both fields set.
    let (frequency, due_at) = match (task.recurring_frequency, task.next_recurring_date) {
        (Some(f), Some(d)) => (f, d),
        _ => {
            tracing::warn!(task_id = %task.id, "Recurring task missing frequency or next date, skipping");
            return Ok(());
        }
    };

    let next = frequency.advance(due_at);

    let clone = Task::insert(
        pool,
        NewTask {
            org_id: task.org_id,
            title: task.title.clone(),
            description: task.description.clone(),
            status: Some(TaskStatus::Todo),
            priority: Some(task.priority),
            assignee_id: task.assignee_id,
            created_by: task.created_by,
            tags: task.tags.clone(),
            due_date: task.due_date.map(|d| frequency.advance(d)),
            is_recurring: true,
            recurring_frequency: Some(frequency),
            next_recurring_date: Some(next),
        },
    )
    .await?;

    Task::set_next_recurring_date(pool, task.id, next).await?;

    tracing::info!(
        source = %task.id,
        clone = %clone.id,
        next = %next,
        "Spawned recurring task occurrence"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono::Utc;
    use taskdeck_shared::models::task::RecurringFrequency;

    #[test]
    fn test_advance_matches_frequency() {
        let due = Utc.with_ymd_and_hms(2025, 4, 30, 6, 0, 0).unwrap();

        assert_eq!(
            RecurringFrequency::Daily.advance(due),
            Utc.with_ymd_and_hms(2025, 5, 1, 6, 0, 0).unwrap()
        );
        assert_eq!(
            RecurringFrequency::Weekly.advance(due),
            Utc.with_ymd_and_hms(2025, 5, 7, 6, 0, 0).unwrap()
        );
        assert_eq!(
            RecurringFrequency::Monthly.advance(due),
            Utc.with_ymd_and_hms(2025, 5, 30, 6, 0, 0).unwrap()
        );
    }
}
