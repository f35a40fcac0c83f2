//! Post pages: index, group, new, view, edit, comment.

use std::convert::Infallible;

use axum::{
    Form, Json, Router,
    extract::{FromRequest, Multipart, Path, Query, Request, State, multipart::Field},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use bytes::Bytes;
use serde::Deserialize;
use yatube_common::{AppError, AppResult};
use yatube_core::{
    EditOutcome, FieldErrors, FormOutcome, ImageChange, ImageUpload, PostInput,
};
use yatube_db::entities::post::Model as PostModel;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{post_path, redirect},
    views::{GroupPageView, GroupView, IndexView, PostFormView, PostPageView},
};

/// `?page=` query parameter.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// Form-level error for a body that is neither a readable multipart nor an
/// urlencoded form.
pub const UNREADABLE_FORM: &str = "The submitted form could not be read.";

#[derive(Debug, Deserialize)]
struct CommentForm {
    #[serde(default)]
    text: String,
}

/// Latest posts, cached for a short while.
async fn index(State(state): State<AppState>, Query(query): Query<PageQuery>) -> AppResult<Response> {
    let key = query.page.clone().unwrap_or_default();
    let body = state
        .index_cache
        .get_or_render(&key, || async {
            let page = state.listing_service.index(query.page.as_deref()).await?;
            let view = IndexView::new(page, &state.post_service);
            serde_json::to_vec(&view)
                .map(Bytes::from)
                .map_err(|e| AppError::Internal(format!("Failed to render index: {e}")))
        })
        .await?;

    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

async fn group_posts(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<GroupPageView>> {
    let (group, page) = state
        .listing_service
        .group(&slug, query.page.as_deref())
        .await?;
    Ok(Json(GroupPageView::new(group, page, &state.post_service)))
}

async fn post_view(
    State(state): State<AppState>,
    Path((username, post_id)): Path<(String, String)>,
) -> AppResult<Json<PostPageView>> {
    let detail = state.post_service.view(&username, &post_id).await?;
    Ok(Json(PostPageView::new(detail, &state.post_service)))
}

async fn new_post_form(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<PostFormView>> {
    Ok(Json(
        form_view(&state, None, String::new(), None, FieldErrors::new()).await?,
    ))
}

async fn new_post(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    PostForm(input): PostForm,
) -> AppResult<Response> {
    let input = match input {
        Ok(input) => input,
        Err(errors) => {
            return Ok(
                Json(form_view(&state, None, String::new(), None, errors).await?).into_response(),
            );
        }
    };
    let (text, group) = (input.text.clone(), input.group.clone());

    match state.post_service.create(&user, input).await? {
        FormOutcome::Saved(_) => Ok(redirect("/")),
        FormOutcome::Invalid(errors) => {
            Ok(Json(form_view(&state, None, text, group, errors).await?).into_response())
        }
    }
}

async fn post_edit_form(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((username, post_id)): Path<(String, String)>,
) -> AppResult<Response> {
    stored_edit_form(&state, &user.id, &username, &post_id, FieldErrors::new()).await
}

/// The edit form pre-filled from the stored post, or a redirect to the post
/// for anyone but its author.
async fn stored_edit_form(
    state: &AppState,
    user_id: &str,
    username: &str,
    post_id: &str,
    errors: FieldErrors,
) -> AppResult<Response> {
    let (author, post) = state
        .post_service
        .get_for_author(username, post_id)
        .await?;
    if author.id != user_id {
        return Ok(redirect(&post_path(&author.username, &post.id)));
    }

    let text = post.text.clone();
    Ok(Json(form_view(state, Some(&post), text, None, errors).await?).into_response())
}

async fn post_edit(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((username, post_id)): Path<(String, String)>,
    PostForm(input): PostForm,
) -> AppResult<Response> {
    let input = match input {
        Ok(input) => input,
        Err(errors) => {
            return stored_edit_form(&state, &user.id, &username, &post_id, errors).await;
        }
    };
    let (text, group) = (input.text.clone(), input.group.clone());

    match state
        .post_service
        .edit(&user.id, &username, &post_id, input)
        .await?
    {
        EditOutcome::Saved(post) | EditOutcome::NotAuthor(post) => {
            Ok(redirect(&post_path(&username, &post.id)))
        }
        EditOutcome::Invalid { post, errors } => Ok(Json(
            form_view(&state, Some(&post), text, group, errors).await?,
        )
        .into_response()),
    }
}

async fn add_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((username, post_id)): Path<(String, String)>,
    Form(form): Form<CommentForm>,
) -> AppResult<Response> {
    state
        .comment_service
        .add(&user.id, &username, &post_id, &form.text)
        .await?;
    Ok(redirect(&post_path(&username, &post_id)))
}

/// Build the post form view.
///
/// With `editing` set and no explicit `group`, the post's current group is
/// preselected.
async fn form_view(
    state: &AppState,
    editing: Option<&PostModel>,
    text: String,
    group: Option<String>,
    errors: FieldErrors,
) -> AppResult<PostFormView> {
    let groups = state.group_service.list().await?;

    let group = group.or_else(|| {
        let group_id = editing?.group_id.as_deref()?;
        groups
            .iter()
            .find(|g| g.id == group_id)
            .map(|g| g.slug.clone())
    });

    Ok(PostFormView {
        edit: editing.is_some(),
        post_id: editing.map(|p| p.id.clone()),
        text,
        group,
        image: editing.and_then(|p| state.post_service.image_url(p)),
        groups: groups.into_iter().map(GroupView::from).collect(),
        errors,
    })
}

/// Post form fields from a multipart or urlencoded body.
///
/// A body that cannot be read yields form errors rather than a rejection, so
/// the handlers can still answer with a redirect or the form.
struct PostForm(Result<PostInput, FieldErrors>);

/// Urlencoded variant of the post form; it carries no file.
#[derive(Debug, Deserialize)]
struct UrlencodedPostForm {
    #[serde(default)]
    text: String,
    group: Option<String>,
    #[serde(rename = "image-clear")]
    image_clear: Option<String>,
}

impl From<UrlencodedPostForm> for PostInput {
    fn from(form: UrlencodedPostForm) -> Self {
        Self {
            text: form.text,
            group: form.group,
            image: if form.image_clear.is_some() {
                ImageChange::Clear
            } else {
                ImageChange::Keep
            },
        }
    }
}

impl<S> FromRequest<S> for PostForm
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let result = if content_type.starts_with("multipart/form-data") {
            match Multipart::from_request(req, state).await {
                Ok(multipart) => read_multipart(multipart).await,
                Err(rejection) => Err(rejection.body_text()),
            }
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            match Form::<UrlencodedPostForm>::from_request(req, state).await {
                Ok(Form(form)) => Ok(form.into()),
                Err(rejection) => Err(rejection.body_text()),
            }
        } else {
            Err(format!("unsupported content type {content_type:?}"))
        };

        Ok(Self(result.map_err(|reason| {
            tracing::debug!(reason = %reason, "Unreadable post form");
            let mut errors = FieldErrors::new();
            errors.add("form", UNREADABLE_FORM);
            errors
        })))
    }
}

/// Read the `text`, `group`, `image` and `image-clear` fields.
///
/// An uploaded file wins over `image-clear`; an empty file input counts as
/// no upload.
async fn read_multipart(mut multipart: Multipart) -> Result<PostInput, String> {
    let mut input = PostInput::default();
    let mut clear = false;

    while let Some(field) = multipart.next_field().await.map_err(|e| e.body_text())? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "text" => input.text = read_text(field).await?,
            "group" => input.group = Some(read_text(field).await?),
            "image" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(|e| e.body_text())?;
                if !(filename.is_empty() && data.is_empty()) {
                    input.image = ImageChange::Upload(ImageUpload { filename, data });
                }
            }
            "image-clear" => clear = true,
            _ => {}
        }
    }

    if clear && input.image == ImageChange::Keep {
        input.image = ImageChange::Clear;
    }

    Ok(input)
}

async fn read_text(field: Field<'_>) -> Result<String, String> {
    field.text().await.map_err(|e| e.body_text())
}

/// Create the post routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/group/{slug}/", get(group_posts))
        .route("/new/", get(new_post_form).post(new_post))
        .route("/{username}/{post_id}/", get(post_view))
        .route(
            "/{username}/{post_id}/edit/",
            get(post_edit_form).post(post_edit),
        )
        .route("/{username}/{post_id}/comment/", post(add_comment))
}
