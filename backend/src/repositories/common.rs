//! Shared repository utilities.

use sqlx::{Postgres, QueryBuilder};

/// Column list of `leave_requests`, in `LeaveRequest` field order.
pub const LEAVE_REQUEST_COLUMNS: &str = "id, user_id, leave_type, start_date, end_date, reason, \
     working_days, status, approved_by, rejection_reason, created_at, updated_at";

pub const LEAVE_BALANCE_COLUMNS: &str =
    "id, user_id, annual, sick, maternity, paternity, bereavement, created_at, updated_at";

/// Appends WHERE or AND to the query builder depending on whether a clause has already been added.
pub fn push_clause(builder: &mut QueryBuilder<'_, Postgres>, has_clause: &mut bool) {
    if *has_clause {
        builder.push(" AND ");
    } else {
        builder.push(" WHERE ");
        *has_clause = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_clause_starts_with_where_then_and() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1 FROM leave_requests");
        let mut has_clause = false;
        push_clause(&mut builder, &mut has_clause);
        builder.push("a = 1");
        push_clause(&mut builder, &mut has_clause);
        builder.push("b = 2");
        assert_eq!(
            builder.sql(),
            "SELECT 1 FROM leave_requests WHERE a = 1 AND b = 2"
        );
    }
}
