use super::{page_context, redirect, render, Db, PostView, Tera};
use crate::context::CurrentUser;
use crate::database::UserDb;
use crate::error::AppResult;
use crate::hooks::use_photos;
use crate::model::User;
use crate::routes;
use actix_web::HttpResponse;
use chrono::Utc;
use serde::Serialize;

#[derive(Serialize, Debug)]
struct ProfileCard {
    username: String,
    full_name: String,
}

impl From<&User> for ProfileCard {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            full_name: user.full_name.clone(),
        }
    }
}

#[derive(Serialize, Debug)]
struct SidebarView {
    user: ProfileCard,
    suggestions: Vec<ProfileCard>,
}

pub async fn dashboard(current: CurrentUser, db: Db, tera: Tera) -> AppResult<HttpResponse> {
    if !current.is_signed_in() {
        return Ok(redirect(routes::LOGIN));
    }
    let mut ctx = page_context("Instagram", &current);
    ctx.insert("next", routes::DASHBOARD);
    ctx.insert("posts", &Vec::<PostView>::new());
    ctx.insert("sidebar", &None::<SidebarView>);
    if let Some((_, user)) = current.profile() {
        let now = Utc::now().timestamp_millis();
        let posts = use_photos(&db, user)?
            .into_iter()
            .map(|entry| PostView::new(entry, now))
            .collect::<Vec<_>>();
        let suggestions = db
            .get_suggested_profiles(user.user_id, &user.following)?
            .iter()
            .map(ProfileCard::from)
            .collect();
        ctx.insert("posts", &posts);
        ctx.insert(
            "sidebar",
            &Some(SidebarView {
                user: ProfileCard::from(user),
                suggestions,
            }),
        );
    }
    render(&tera, "dashboard.html", &ctx)
}
