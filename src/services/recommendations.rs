use std::collections::HashSet;

use rand::Rng;

use crate::{
    db::CatalogStore,
    error::{AppError, AppResult},
    models::{BookId, BookSummary, Recommendation, User},
    services::{
        candidates::{self, DEFAULT_LIMIT},
        completion::{ChatMessage, CompletionClient, CompletionRequest},
    },
};

/// Number of books the completion service is asked to pick
pub const RECOMMENDATION_COUNT: usize = 10;

/// Fixed parameters of every recommendation call
#[derive(Debug, Clone)]
pub struct RecommendationSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Language of the explanatory comments
    pub language: String,
    /// Seed for the candidate shuffle; `None` draws fresh entropy per request
    pub candidate_seed: Option<u64>,
}

impl Default for RecommendationSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            max_tokens: 2000,
            temperature: 0.7,
            language: "Russian".to_string(),
            candidate_seed: None,
        }
    }
}

/// Generates personalized book recommendations
///
/// Flow, single pass and no retries:
/// 1. Gather the user's favorites and a shuffled candidate pool drawn from
///    their liked categories
/// 2. Compose a two-message prompt embedding both lists
/// 3. Dispatch one completion call
/// 4. Parse the reply as a JSON array of `{id, comment}`
/// 5. Drop any entry whose id was not offered as a candidate
pub async fn recommend<R: Rng + ?Sized>(
    store: &dyn CatalogStore,
    completion: &dyn CompletionClient,
    settings: &RecommendationSettings,
    user: &User,
    rng: &mut R,
) -> AppResult<Vec<Recommendation>> {
    let profile = store
        .profile_for_user(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

    let liked_categories = store.liked_categories(profile.id).await?;
    if liked_categories.is_empty() {
        return Err(AppError::InvalidInput(
            "No liked categories to base recommendations on".to_string(),
        ));
    }

    let favorites = candidates::select_favorites(store, user.id, DEFAULT_LIMIT).await?;
    let favorite_ids: Vec<BookId> = favorites.iter().map(|b| b.id).collect();
    let pool = candidates::select_candidates(
        store,
        &liked_categories,
        &favorite_ids,
        DEFAULT_LIMIT,
        rng,
    )
    .await?;

    // nothing could survive the offered-id filter
    if pool.is_empty() {
        tracing::info!(user_id = user.id, "No candidate books, skipping completion");
        return Ok(Vec::new());
    }

    tracing::info!(
        user_id = user.id,
        favorites = favorites.len(),
        candidates = pool.len(),
        backend = completion.name(),
        "Requesting recommendations"
    );

    let request = CompletionRequest {
        model: settings.model.clone(),
        messages: compose_prompt(&favorites, &pool, &settings.language)?,
        max_tokens: settings.max_tokens,
        temperature: settings.temperature,
        n: 1,
    };

    let content = completion.complete(request).await?;
    let parsed = parse_recommendations(&content)?;

    let offered: HashSet<BookId> = pool.iter().map(|b| b.id).collect();
    let accepted = retain_offered(parsed, &offered);

    tracing::info!(
        user_id = user.id,
        recommended = accepted.len(),
        "Recommendations generated"
    );

    Ok(accepted)
}

/// Builds the system and user messages sent to the completion service
pub fn compose_prompt(
    favorites: &[BookSummary],
    candidates: &[BookSummary],
    language: &str,
) -> AppResult<Vec<ChatMessage>> {
    let favorites_json = serde_json::to_string(favorites)
        .map_err(|e| AppError::Internal(format!("Prompt serialization error: {}", e)))?;
    let candidates_json = serde_json::to_string(candidates)
        .map_err(|e| AppError::Internal(format!("Prompt serialization error: {}", e)))?;

    let system = format!(
        "You are a helpful assistant that recommends books based on the user's favorite books \
         and a list of available books. You always answer in {}.",
        language
    );
    let user = format!(
        "Here is the list of the user's favorite books: {favorites}. \
         Based on these books, recommend exactly {count} books from this list of candidates: {candidates}. \
         Explain why each book was chosen. Return ONLY a JSON array of objects with the fields \
         \"id\" (the candidate's id) and \"comment\" (the reason for the recommendation). \
         Do not add any text or formatting around the JSON. Comments must be written in {language}.",
        favorites = favorites_json,
        count = RECOMMENDATION_COUNT,
        candidates = candidates_json,
        language = language,
    );

    Ok(vec![ChatMessage::system(system), ChatMessage::user(user)])
}

/// Strips a surrounding markdown code fence, if any
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parses the completion text as a JSON array of recommendations
pub fn parse_recommendations(content: &str) -> AppResult<Vec<Recommendation>> {
    serde_json::from_str::<Vec<Recommendation>>(strip_code_fence(content)).map_err(|e| {
        tracing::warn!(error = %e, "Completion did not return a recommendation array");
        AppError::ExternalApi("Failed to get recommendations from completion service".to_string())
    })
}

/// Keeps only recommendations pointing at offered candidates, first occurrence wins
fn retain_offered(parsed: Vec<Recommendation>, offered: &HashSet<BookId>) -> Vec<Recommendation> {
    let mut seen = HashSet::new();
    let mut accepted = Vec::with_capacity(parsed.len());

    for recommendation in parsed {
        if !offered.contains(&recommendation.id) {
            tracing::warn!(id = recommendation.id, "Dropping recommendation outside candidate set");
            continue;
        }
        if seen.insert(recommendation.id) {
            accepted.push(recommendation);
        }
    }

    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::MemoryStore,
        models::NewUser,
        services::completion::MockCompletionClient,
        test_support::book_in,
    };
    use rand::{rngs::StdRng, SeedableRng};

    async fn reader(store: &MemoryStore) -> (User, crate::models::Profile) {
        store
            .create_user(NewUser {
                email: "reader@example.com".to_string(),
                phone_number: "87775554422".to_string(),
                full_name: "Reader".to_string(),
                password_hash: String::new(),
            })
            .await
            .unwrap()
    }

    fn mock_returning(content: impl Into<String>) -> MockCompletionClient {
        let content: String = content.into();
        let mut mock = MockCompletionClient::new();
        mock.expect_name().return_const("mock");
        mock.expect_complete()
            .times(1)
            .returning(move |_| Ok(content.clone()));
        mock
    }

    #[test]
    fn test_parse_plain_array() {
        let parsed = parse_recommendations(r#"[{"id": 1, "comment": "Great"}]"#).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].comment, "Great");
    }

    #[test]
    fn test_parse_fenced_array() {
        let parsed =
            parse_recommendations("```json\n[{\"id\": 2, \"comment\": \"Fine\"}]\n```").unwrap();
        assert_eq!(parsed[0].id, 2);
    }

    #[test]
    fn test_parse_prose_is_external_error() {
        let err = parse_recommendations("Sure! Here are some books you might like.").unwrap_err();
        assert!(matches!(err, AppError::ExternalApi(_)));
    }

    #[test]
    fn test_parse_object_instead_of_array_is_external_error() {
        let err = parse_recommendations(r#"{"id": 1, "comment": "x"}"#).unwrap_err();
        assert!(matches!(err, AppError::ExternalApi(_)));
    }

    #[test]
    fn test_retain_offered_drops_unknown_and_duplicates() {
        let offered: HashSet<BookId> = [1, 2].into_iter().collect();
        let parsed = vec![
            Recommendation { id: 1, comment: "a".into() },
            Recommendation { id: 99, comment: "b".into() },
            Recommendation { id: 1, comment: "c".into() },
            Recommendation { id: 2, comment: "d".into() },
        ];

        let accepted = retain_offered(parsed, &offered);

        let ids: Vec<BookId> = accepted.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(accepted[0].comment, "a");
    }

    #[test]
    fn test_compose_prompt_embeds_both_lists() {
        let favorite = BookSummary {
            id: 1,
            title: "Dune".to_string(),
            subtitle: None,
            authors: "Frank Herbert".to_string(),
            categories: Some("Sci-Fi".to_string()),
            thumbnail: None,
            description: None,
            published_year: Some(1965),
            average_rating: Some(4.2),
        };
        let candidate = BookSummary {
            id: 2,
            title: "Hyperion".to_string(),
            ..favorite.clone()
        };

        let messages = compose_prompt(&[favorite], &[candidate], "English").unwrap();

        assert_eq!(messages.len(), 2);
        assert!(messages[0].content.contains("English"));
        assert!(messages[1].content.contains("\"title\":\"Dune\""));
        assert!(messages[1].content.contains("\"title\":\"Hyperion\""));
        assert!(messages[1].content.contains("exactly 10"));
    }

    #[tokio::test]
    async fn test_recommend_filters_to_candidates() {
        let store = MemoryStore::new();
        let (user, profile) = reader(&store).await;
        let favorite = store.create_book(book_in(1, "Dune", Some("Sci-Fi"))).await.unwrap();
        let candidate = store
            .create_book(book_in(2, "Hyperion", Some("Sci-Fi, Drama")))
            .await
            .unwrap();
        store.create_book(book_in(3, "Emma", Some("Romance"))).await.unwrap();
        store.insert_favorite(user.id, favorite.id).await.unwrap();
        store.insert_liked_category(profile.id, "Sci-Fi").await.unwrap();

        let mock = mock_returning(format!(
            r#"[{{"id": {}, "comment": "Epic"}}, {{"id": {}, "comment": "Already a favorite"}}]"#,
            candidate.id, favorite.id
        ));

        let result = recommend(
            &store,
            &mock,
            &RecommendationSettings::default(),
            &user,
            &mut StdRng::seed_from_u64(3),
        )
        .await
        .unwrap();

        assert_eq!(result, vec![Recommendation { id: candidate.id, comment: "Epic".into() }]);
    }

    #[tokio::test]
    async fn test_recommend_sends_configured_parameters() {
        let store = MemoryStore::new();
        let (user, profile) = reader(&store).await;
        store.create_book(book_in(1, "Dune", Some("Sci-Fi"))).await.unwrap();
        store.insert_liked_category(profile.id, "Sci-Fi").await.unwrap();

        let mut mock = MockCompletionClient::new();
        mock.expect_name().return_const("mock");
        mock.expect_complete()
            .withf(|request| {
                request.model == "test-model"
                    && request.max_tokens == 500
                    && request.n == 1
                    && request.messages.len() == 2
            })
            .times(1)
            .returning(|_| Ok("[]".to_string()));

        let settings = RecommendationSettings {
            model: "test-model".to_string(),
            max_tokens: 500,
            ..RecommendationSettings::default()
        };

        let result = recommend(&store, &mock, &settings, &user, &mut StdRng::seed_from_u64(0))
            .await
            .unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_recommend_non_json_reply_is_external_error() {
        let store = MemoryStore::new();
        let (user, profile) = reader(&store).await;
        store.create_book(book_in(1, "Dune", Some("Sci-Fi"))).await.unwrap();
        store.insert_liked_category(profile.id, "Sci-Fi").await.unwrap();

        let mock = mock_returning("I cannot help with that.");

        let err = recommend(
            &store,
            &mock,
            &RecommendationSettings::default(),
            &user,
            &mut StdRng::seed_from_u64(0),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::ExternalApi(_)));
    }

    #[tokio::test]
    async fn test_recommend_propagates_service_failure() {
        let store = MemoryStore::new();
        let (user, profile) = reader(&store).await;
        store.create_book(book_in(1, "Dune", Some("Sci-Fi"))).await.unwrap();
        store.insert_liked_category(profile.id, "Sci-Fi").await.unwrap();

        let mut mock = MockCompletionClient::new();
        mock.expect_name().return_const("mock");
        mock.expect_complete()
            .times(1)
            .returning(|_| Err(AppError::ExternalApi("status 503".to_string())));

        let err = recommend(
            &store,
            &mock,
            &RecommendationSettings::default(),
            &user,
            &mut StdRng::seed_from_u64(0),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::ExternalApi(_)));
    }

    #[tokio::test]
    async fn test_recommend_without_liked_categories_skips_service() {
        let store = MemoryStore::new();
        let (user, _) = reader(&store).await;

        let mut mock = MockCompletionClient::new();
        mock.expect_complete().never();

        let err = recommend(
            &store,
            &mock,
            &RecommendationSettings::default(),
            &user,
            &mut StdRng::seed_from_u64(0),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_recommend_without_candidates_skips_service() {
        let store = MemoryStore::new();
        let (user, profile) = reader(&store).await;
        let only = store.create_book(book_in(1, "Dune", Some("Sci-Fi"))).await.unwrap();
        store.insert_favorite(user.id, only.id).await.unwrap();
        store.insert_liked_category(profile.id, "Sci-Fi").await.unwrap();
        store.insert_liked_category(profile.id, "Vanished").await.unwrap();

        let mut mock = MockCompletionClient::new();
        mock.expect_name().return_const("mock");
        mock.expect_complete().never();

        let result = recommend(
            &store,
            &mock,
            &RecommendationSettings::default(),
            &user,
            &mut StdRng::seed_from_u64(0),
        )
        .await
        .unwrap();

        assert!(result.is_empty());
    }
}
