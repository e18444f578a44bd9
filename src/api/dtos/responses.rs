use serde::Serialize;

#[derive(Serialize)]
pub struct AccessResponse {
    pub post_id: String,
    pub can_access: bool,
}

#[derive(Serialize)]
pub struct FansResponse {
    pub post_id: String,
    pub fans: Vec<String>,
}

#[derive(Serialize)]
pub struct ReactionResponse {
    pub post_id: String,
    pub created: bool,
}

#[derive(Serialize)]
pub struct CommentResponse {
    pub post_id: String,
    pub comment_id: String,
}
