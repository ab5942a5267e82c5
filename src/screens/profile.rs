// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Own profile screen.
//!
//! Shows and edits the signed-in user's record, changes the profile photo,
//! and lists comments left on the profile. While mounted it keeps a live
//! subscription to those comments and sweeps expired ones on a timer.

use super::{apply_change, report, ScreenScope};
use crate::db::{paths, Subscription};
use crate::error::Result;
use crate::models::{ProfileComment, ProfileForm, User};
use crate::services::blob::{content_type_for, profile_image_path};
use crate::services::expiry::{is_expired, SweepReport, Sweeper};
use crate::services::identity::require_identity;
use crate::services::picker::pick_photo;
use crate::AppContext;
use std::sync::Arc;
use tokio::sync::mpsc;
use validator::Validate;

pub struct ProfileScreen {
    ctx: Arc<AppContext>,
    scope: ScreenScope,
    pub user: Option<User>,
    pub form: ProfileForm,
    pub editing: bool,
    /// Newest first
    pub comments: Vec<ProfileComment>,
    pub notice: Option<String>,
    subscription: Option<Subscription>,
    sweeper: Option<Sweeper>,
    sweep_reports: Option<mpsc::UnboundedReceiver<SweepReport>>,
}

impl ProfileScreen {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self {
            ctx,
            scope: ScreenScope::new(),
            user: None,
            form: ProfileForm::default(),
            editing: false,
            comments: Vec::new(),
            notice: None,
            subscription: None,
            sweeper: None,
            sweep_reports: None,
        }
    }

    /// Load the user and comments, then start the subscription and sweeper.
    pub async fn mount(&mut self) -> Result<()> {
        match self.load().await {
            Ok(()) => Ok(()),
            Err(e) => Err(report(&mut self.notice, e)),
        }
    }

    async fn load(&mut self) -> Result<()> {
        let me = require_identity(self.ctx.identity.as_ref())?;
        let user = self.scope.run(self.ctx.records.require_user(&me.id)).await?;
        let comments = self
            .scope
            .run(self.ctx.records.profile_comments(&me.id))
            .await?;
        let subscription = self
            .scope
            .run(self.ctx.records.subscribe(&paths::profile_comments(&me.id)))
            .await?;

        self.form = ProfileForm::from_user(&user);
        self.user = Some(user);
        self.comments = comments;
        self.subscription = Some(subscription);
        self.start_sweeper(me.id);
        Ok(())
    }

    fn start_sweeper(&mut self, uid: String) {
        let (tx, rx) = mpsc::unbounded_channel();
        let ctx = self.ctx.clone();
        let sweeper = Sweeper::spawn(
            self.ctx.config.sweep_interval,
            self.scope.child_token(),
            tx,
            move || {
                let ctx = ctx.clone();
                let uid = uid.clone();
                async move { ctx.expiry().sweep_profile_comments(&uid, ctx.now()).await }
            },
        );
        self.sweeper = Some(sweeper);
        self.sweep_reports = Some(rx);
    }

    /// Comments currently worth showing (expired ones hidden until swept).
    pub fn visible_comments(&self) -> impl Iterator<Item = &ProfileComment> {
        let now = self.ctx.now();
        self.comments
            .iter()
            .filter(move |c| !is_expired(c.timestamp, now))
    }

    /// Apply queued live changes and finished sweeps to the view.
    pub async fn refresh(&mut self) -> Result<()> {
        let Some(uid) = self.user.as_ref().map(|u| u.uid.clone()) else {
            return Ok(());
        };
        let parent = paths::profile_comments(&uid);
        let mut reload = false;

        if let Some(subscription) = self.subscription.as_mut() {
            while let Some(change) = subscription.try_next() {
                reload |= !apply_change(&mut self.comments, &parent, change);
            }
        }
        if let Some(reports) = self.sweep_reports.as_mut() {
            while let Ok(sweep) = reports.try_recv() {
                self.comments.retain(|c| !sweep.purged.contains(&c.id));
            }
        }

        if reload {
            match self.scope.run(self.ctx.records.profile_comments(&uid)).await {
                Ok(comments) => self.comments = comments,
                Err(e) => return Err(report(&mut self.notice, e)),
            }
        }
        self.comments
            .sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(a.id.cmp(&b.id)));
        Ok(())
    }

    /// Wait for the next sweep and drop what it purged.
    pub async fn wait_for_sweep(&mut self) -> Option<SweepReport> {
        let sweep = self.sweep_reports.as_mut()?.recv().await?;
        self.comments.retain(|c| !sweep.purged.contains(&c.id));
        Some(sweep)
    }

    pub fn edit(&mut self) {
        self.editing = true;
    }

    /// Drop unsaved edits.
    pub fn cancel_edit(&mut self) {
        if let Some(user) = &self.user {
            self.form = ProfileForm::from_user(user);
        }
        self.editing = false;
    }

    /// Validate and save the edited profile fields.
    pub async fn save(&mut self) -> Result<()> {
        let Some(uid) = self.user.as_ref().map(|u| u.uid.clone()) else {
            return Ok(());
        };
        if let Err(e) = self.form.validate() {
            return Err(report(&mut self.notice, e.into()));
        }

        let result = self
            .scope
            .run(self.ctx.records.update_profile(&uid, &self.form))
            .await;
        if let Err(e) = result {
            return Err(report(&mut self.notice, e));
        }

        if let Some(user) = self.user.as_mut() {
            self.form.apply_to(user);
        }
        self.editing = false;
        self.notice = None;
        tracing::info!(uid = %uid, "Profile saved");
        Ok(())
    }

    /// Pick a new profile photo, upload it and store its URL.
    ///
    /// Returns `false` if the user cancelled the picker.
    pub async fn change_photo(&mut self) -> Result<bool> {
        let Some(uid) = self.user.as_ref().map(|u| u.uid.clone()) else {
            return Ok(false);
        };
        match self.upload_photo(&uid).await {
            Ok(Some(url)) => {
                if let Some(user) = self.user.as_mut() {
                    user.profile_image = Some(url);
                }
                self.notice = None;
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(e) => Err(report(&mut self.notice, e)),
        }
    }

    async fn upload_photo(&self, uid: &str) -> Result<Option<String>> {
        let picked = self.scope.run(pick_photo(self.ctx.picker.as_ref())).await?;
        let Some((photo, bytes)) = picked else {
            return Ok(None);
        };

        let path = profile_image_path(uid);
        self.scope
            .run(self.ctx.blobs.upload(&path, bytes, content_type_for(&photo.uri)))
            .await?;
        let url = self.scope.run(self.ctx.blobs.resolve_url(&path)).await?;
        self.scope
            .run(self.ctx.records.set_profile_image(uid, &url))
            .await?;
        tracing::info!(uid, "Profile photo updated");
        Ok(Some(url))
    }

    pub fn sign_out(&mut self) {
        self.ctx.identity.sign_out();
        self.unmount();
    }

    /// Stop the subscription and the sweeper.
    pub fn unmount(&mut self) {
        self.scope.unmount();
        self.subscription = None;
        self.sweeper = None;
    }

    pub fn is_sweeping(&self) -> bool {
        self.sweeper.as_ref().is_some_and(|s| !s.is_finished())
    }
}
