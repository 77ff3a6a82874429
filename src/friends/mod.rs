mod add;
mod list;

use axum::{Router, routing::get};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list::list).post(add::add))
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::add::add_friend;
    use super::list::list_friends;
    use crate::appresult::AppError;
    use crate::db::testing::{memory_pool, seed_user};

    #[tokio::test]
    async fn add_friend_links_both_sides() {
        let pool = memory_pool().await;
        let ana = seed_user(&pool, "Ana", "ana@example.com").await;
        let bo = seed_user(&pool, "Bo", "bo@example.com").await;

        let friend = add_friend(&pool, ana, "bo@example.com").await.unwrap();
        assert_eq!(friend.id, bo);
        assert_eq!(friend.name, "Bo");

        let anas = list_friends(&pool, ana).await.unwrap();
        let bos = list_friends(&pool, bo).await.unwrap();
        assert_eq!(anas.len(), 1);
        assert_eq!(anas[0].id, bo);
        assert_eq!(bos.len(), 1);
        assert_eq!(bos[0].id, ana);
    }

    #[tokio::test]
    async fn duplicate_edge_conflicts_from_either_direction() {
        let pool = memory_pool().await;
        let ana = seed_user(&pool, "Ana", "ana@example.com").await;
        let bo = seed_user(&pool, "Bo", "bo@example.com").await;

        add_friend(&pool, ana, "bo@example.com").await.unwrap();

        assert!(matches!(
            add_friend(&pool, ana, "bo@example.com").await,
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            add_friend(&pool, bo, "ana@example.com").await,
            Err(AppError::Conflict(_))
        ));

        // the failed retries must not have duplicated the edge
        assert_eq!(list_friends(&pool, ana).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn self_friending_is_rejected() {
        let pool = memory_pool().await;
        let ana = seed_user(&pool, "Ana", "ana@example.com").await;

        assert!(matches!(
            add_friend(&pool, ana, "ana@example.com").await,
            Err(AppError::InvalidOperation(_))
        ));
    }

    #[tokio::test]
    async fn unknown_email_is_not_found() {
        let pool = memory_pool().await;
        let ana = seed_user(&pool, "Ana", "ana@example.com").await;

        assert!(matches!(
            add_friend(&pool, ana, "nonexistent@x").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn listing_unknown_requester_is_not_found() {
        let pool = memory_pool().await;

        assert!(matches!(
            list_friends(&pool, Uuid::now_v7()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn friends_list_is_ordered_by_name() {
        let pool = memory_pool().await;
        let ana = seed_user(&pool, "Ana", "ana@example.com").await;
        seed_user(&pool, "Zed", "zed@example.com").await;
        seed_user(&pool, "Cleo", "cleo@example.com").await;

        add_friend(&pool, ana, "zed@example.com").await.unwrap();
        add_friend(&pool, ana, "cleo@example.com").await.unwrap();

        let names: Vec<_> = list_friends(&pool, ana)
            .await
            .unwrap()
            .into_iter()
            .map(|friend| friend.name)
            .collect();
        assert_eq!(names, ["Cleo", "Zed"]);
    }
}
