//! Subtopic catalogue (read-mostly, owned by the content store)

use rusqlite::{params, Connection, Result};

use crate::domain::{Subject, Subtopic};

pub fn insert_subtopic(conn: &Connection, subject: &Subject, subtopic: &Subtopic) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO subtopics (id, subject, topic_id, name, position)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
        params![
            subtopic.id,
            subject.as_str(),
            subtopic.topic_id,
            subtopic.name,
            subtopic.position,
        ],
    )?;
    Ok(())
}

/// Subtopics of a topic in curriculum order
pub fn list_subtopics(conn: &Connection, subject: &Subject, topic_id: i64) -> Result<Vec<Subtopic>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, topic_id, name, position
        FROM subtopics
        WHERE subject = ?1 AND topic_id = ?2
        ORDER BY position ASC, id ASC
        "#,
    )?;

    let subtopics = stmt
        .query_map(params![subject.as_str(), topic_id], |row| {
            Ok(Subtopic {
                id: row.get(0)?,
                topic_id: row.get(1)?,
                name: row.get(2)?,
                position: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>>>()?;
    Ok(subtopics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::run_migrations;

    #[test]
    fn test_list_subtopics_in_position_order() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        let subject = Subject::new("maths").unwrap();

        for (id, topic_id, position) in [(1, 10, 2), (2, 10, 1), (3, 20, 0)] {
            let subtopic = Subtopic {
                id,
                topic_id,
                name: format!("Subtopic {}", id),
                position,
            };
            insert_subtopic(&conn, &subject, &subtopic).unwrap();
        }

        let ids: Vec<i64> = list_subtopics(&conn, &subject, 10)
            .unwrap()
            .iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec![2, 1]);
        assert!(list_subtopics(&conn, &subject, 99).unwrap().is_empty());
    }
}
