//! Writes and their cache side effects.
//!
//! Each write is described by a [`Mutation`] value that knows which cache
//! prefixes it invalidates and which toasts it raises. Mutations are never
//! retried.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use studioai_core::types::RecordId;

use crate::error::ClientError;
use crate::keys::{self, QueryKey};
use crate::notify::Toast;
use crate::StudioClient;

/// Every write the client can perform, with the ids that scope its effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Login,
    Register,
    Logout,
    UpdateProfile,
    ChangePassword,
    ForgotPassword,
    ResetPassword,

    UpdateWorkspace { workspace_id: RecordId },
    InviteMember { workspace_id: RecordId },
    UpdateMemberRole { workspace_id: RecordId },
    RemoveMember { workspace_id: RecordId },

    CreateShow { workspace_id: RecordId },
    UpdateShow { workspace_id: RecordId, show_id: RecordId },
    DeleteShow { workspace_id: RecordId, show_id: RecordId },
    GenerateEpisode { workspace_id: RecordId, show_id: RecordId },

    CreateEpisode { workspace_id: RecordId, show_id: RecordId },
    UpdateEpisode { workspace_id: RecordId, show_id: RecordId, episode_id: RecordId },
    DeleteEpisode { workspace_id: RecordId, show_id: RecordId, episode_id: RecordId },
    ApproveEpisode { workspace_id: RecordId, show_id: RecordId, episode_id: RecordId },
    RejectEpisode { workspace_id: RecordId, show_id: RecordId, episode_id: RecordId },
    QueueRender { workspace_id: RecordId, show_id: RecordId, episode_id: RecordId },
    GenerateScenes { workspace_id: RecordId, show_id: RecordId, episode_id: RecordId },

    CreateCharacter { workspace_id: RecordId, show_id: RecordId },
    UpdateCharacter { workspace_id: RecordId, show_id: RecordId, character_id: RecordId },
    DeleteCharacter { workspace_id: RecordId, show_id: RecordId, character_id: RecordId },
    GenerateCharacterPrompts { workspace_id: RecordId, show_id: RecordId, character_id: RecordId },

    CreateScene { workspace_id: RecordId, show_id: RecordId, episode_id: RecordId },
    UpdateScene { workspace_id: RecordId, show_id: RecordId, episode_id: RecordId },
    DeleteScene { workspace_id: RecordId, show_id: RecordId, episode_id: RecordId },

    CreateVoiceActor { workspace_id: RecordId },
    UpdateVoiceActor { workspace_id: RecordId },
    DeleteVoiceActor { workspace_id: RecordId },
    UpdateShowProduction { workspace_id: RecordId, show_id: RecordId },
    UpdateCharacterVoice { workspace_id: RecordId, show_id: RecordId, character_id: RecordId },
    UploadEmotionRef { workspace_id: RecordId, show_id: RecordId, character_id: RecordId },
    UpdateEmotionRef { workspace_id: RecordId, show_id: RecordId, character_id: RecordId },
    DeleteEmotionRef { workspace_id: RecordId, show_id: RecordId, character_id: RecordId },

    MarkNotificationRead,
    MarkAllNotificationsRead,

    StartCheckout { workspace_id: RecordId },
    OpenBillingPortal { workspace_id: RecordId },
    CancelSubscription { workspace_id: RecordId },

    CancelRenderJob,
}

impl Mutation {
    /// Stable name for logs.
    pub fn name(&self) -> &'static str {
        use Mutation::*;
        match self {
            Login => "login",
            Register => "register",
            Logout => "logout",
            UpdateProfile => "update_profile",
            ChangePassword => "change_password",
            ForgotPassword => "forgot_password",
            ResetPassword => "reset_password",
            UpdateWorkspace { .. } => "update_workspace",
            InviteMember { .. } => "invite_member",
            UpdateMemberRole { .. } => "update_member_role",
            RemoveMember { .. } => "remove_member",
            CreateShow { .. } => "create_show",
            UpdateShow { .. } => "update_show",
            DeleteShow { .. } => "delete_show",
            GenerateEpisode { .. } => "generate_episode",
            CreateEpisode { .. } => "create_episode",
            UpdateEpisode { .. } => "update_episode",
            DeleteEpisode { .. } => "delete_episode",
            ApproveEpisode { .. } => "approve_episode",
            RejectEpisode { .. } => "reject_episode",
            QueueRender { .. } => "queue_render",
            GenerateScenes { .. } => "generate_scenes",
            CreateCharacter { .. } => "create_character",
            UpdateCharacter { .. } => "update_character",
            DeleteCharacter { .. } => "delete_character",
            GenerateCharacterPrompts { .. } => "generate_character_prompts",
            CreateScene { .. } => "create_scene",
            UpdateScene { .. } => "update_scene",
            DeleteScene { .. } => "delete_scene",
            CreateVoiceActor { .. } => "create_voice_actor",
            UpdateVoiceActor { .. } => "update_voice_actor",
            DeleteVoiceActor { .. } => "delete_voice_actor",
            UpdateShowProduction { .. } => "update_show_production",
            UpdateCharacterVoice { .. } => "update_character_voice",
            UploadEmotionRef { .. } => "upload_emotion_ref",
            UpdateEmotionRef { .. } => "update_emotion_ref",
            DeleteEmotionRef { .. } => "delete_emotion_ref",
            MarkNotificationRead => "mark_notification_read",
            MarkAllNotificationsRead => "mark_all_notifications_read",
            StartCheckout { .. } => "start_checkout",
            OpenBillingPortal { .. } => "open_billing_portal",
            CancelSubscription { .. } => "cancel_subscription",
            CancelRenderJob => "cancel_render_job",
        }
    }

    /// Cache prefixes to invalidate after success.
    pub fn invalidates(&self) -> Vec<QueryKey> {
        use Mutation::*;
        match self {
            Login | Register | Logout | ChangePassword | ForgotPassword | ResetPassword => vec![],
            UpdateProfile => vec![keys::me()],

            UpdateWorkspace { workspace_id: w } => vec![keys::workspace(w)],
            InviteMember { workspace_id: w } | RemoveMember { workspace_id: w } => {
                vec![keys::workspace_members(w), keys::workspace_usage(w)]
            }
            UpdateMemberRole { workspace_id: w } => vec![keys::workspace_members(w)],

            CreateShow { workspace_id: w } => vec![keys::shows(w), keys::workspace_usage(w)],
            UpdateShow { workspace_id: w, show_id: s } => vec![keys::show(w, s), keys::shows(w)],
            DeleteShow { workspace_id: w, show_id: s } => {
                vec![keys::shows(w), keys::show(w, s), keys::workspace_usage(w)]
            }
            GenerateEpisode { workspace_id: w, show_id: s } => vec![
                keys::episodes_of(w, s),
                keys::workspace_usage(w),
                keys::pipeline(w),
            ],

            CreateEpisode { workspace_id: w, show_id: s } => {
                vec![keys::episodes_of(w, s), keys::workspace_usage(w)]
            }
            UpdateEpisode { workspace_id: w, show_id: s, episode_id: e } => {
                vec![keys::episode(w, s, e), keys::episodes_of(w, s)]
            }
            DeleteEpisode { workspace_id: w, show_id: s, episode_id: e } => vec![
                keys::episodes_of(w, s),
                keys::episode(w, s, e),
                keys::pipeline(w),
            ],
            ApproveEpisode { workspace_id: w, show_id: s, episode_id: e }
            | RejectEpisode { workspace_id: w, show_id: s, episode_id: e } => vec![
                keys::episode(w, s, e),
                keys::episodes_of(w, s),
                keys::review_queue(w),
            ],
            QueueRender { workspace_id: w, show_id: s, episode_id: e } => vec![
                keys::episode(w, s, e),
                keys::episodes_of(w, s),
                keys::pipeline(w),
            ],
            GenerateScenes { workspace_id: w, show_id: s, episode_id: e } => vec![
                keys::episode(w, s, e),
                keys::scenes(w, s, e),
                keys::pipeline(w),
            ],

            CreateCharacter { workspace_id: w, show_id: s } => vec![keys::characters(w, s)],
            UpdateCharacter { workspace_id: w, show_id: s, character_id: c }
            | DeleteCharacter { workspace_id: w, show_id: s, character_id: c } => {
                vec![keys::character(w, s, c), keys::characters(w, s)]
            }
            GenerateCharacterPrompts { workspace_id: w, show_id: s, character_id: c } => {
                vec![keys::character(w, s, c)]
            }

            CreateScene { workspace_id: w, show_id: s, episode_id: e }
            | UpdateScene { workspace_id: w, show_id: s, episode_id: e }
            | DeleteScene { workspace_id: w, show_id: s, episode_id: e } => {
                vec![keys::scenes(w, s, e), keys::pipeline(w)]
            }

            CreateVoiceActor { workspace_id: w }
            | UpdateVoiceActor { workspace_id: w }
            | DeleteVoiceActor { workspace_id: w } => vec![keys::voice_actors(w)],
            UpdateShowProduction { workspace_id: w, show_id: s } => {
                vec![keys::show_production_profile(w, s)]
            }
            UpdateCharacterVoice { workspace_id: w, show_id: s, character_id: c }
            | UploadEmotionRef { workspace_id: w, show_id: s, character_id: c }
            | UpdateEmotionRef { workspace_id: w, show_id: s, character_id: c }
            | DeleteEmotionRef { workspace_id: w, show_id: s, character_id: c } => {
                vec![keys::character_production(w, s, c)]
            }

            MarkNotificationRead | MarkAllNotificationsRead => vec![
                keys::family("notifications"),
                keys::family("notification-count"),
            ],

            // The plan only changes once the provider's webhook lands.
            StartCheckout { .. } | OpenBillingPortal { .. } => vec![],
            CancelSubscription { workspace_id: w } => {
                vec![keys::billing_subscription(w), keys::workspace(w)]
            }

            CancelRenderJob => vec![
                keys::superadmin_render_queue(),
                keys::pipeline_global_queue(),
            ],
        }
    }

    /// Toast on success, if any.
    pub fn success_message(&self) -> Option<&'static str> {
        use Mutation::*;
        let message = match self {
            Login | Register => return None,
            Logout => "Logged out",
            UpdateProfile => "Profile updated",
            ChangePassword => "Password changed",
            ForgotPassword => "Password reset email sent if account exists",
            ResetPassword => "Password updated",
            UpdateWorkspace { .. } => "Workspace updated",
            InviteMember { .. } => "Invitation sent",
            UpdateMemberRole { .. } => "Member role updated",
            RemoveMember { .. } => "Member removed",
            CreateShow { .. } => "Show created!",
            UpdateShow { .. } => "Show updated",
            DeleteShow { .. } => "Show archived",
            GenerateEpisode { .. } => "Episode generation started!",
            CreateEpisode { .. } => "Episode created",
            UpdateEpisode { .. } => "Episode updated",
            DeleteEpisode { .. } => "Episode deleted",
            ApproveEpisode { .. } => "Episode approved and published!",
            RejectEpisode { .. } => "Episode rejected",
            QueueRender { .. } => "Episode queued for render",
            GenerateScenes { .. } => "Scene storyboard generated",
            CreateCharacter { .. } => "Character created!",
            UpdateCharacter { .. } => return None,
            DeleteCharacter { .. } => "Character archived",
            GenerateCharacterPrompts { .. } => "ComfyUI prompts generated!",
            CreateScene { .. } => "Scene created",
            UpdateScene { .. } => "Scene updated",
            DeleteScene { .. } => "Scene deleted",
            CreateVoiceActor { .. } => "Voice actor created",
            UpdateVoiceActor { .. } => "Voice actor updated",
            DeleteVoiceActor { .. } => "Voice actor removed",
            UpdateShowProduction { .. } => "Production profile saved",
            UpdateCharacterVoice { .. } => "Voice assignment saved",
            UploadEmotionRef { .. } => "Emotion reference uploaded",
            UpdateEmotionRef { .. } => "Emotion reference updated",
            DeleteEmotionRef { .. } => "Emotion reference removed",
            MarkNotificationRead | MarkAllNotificationsRead => return None,
            StartCheckout { .. } | OpenBillingPortal { .. } => return None,
            CancelSubscription { .. } => "Subscription will end at the close of the billing period",
            CancelRenderJob => "Render job cancelled",
        };
        Some(message)
    }

    /// Toast text when the server gives no message of its own.
    pub fn failure_message(&self) -> &'static str {
        use Mutation::*;
        match self {
            Login => "Login failed",
            Register => "Registration failed",
            Logout => "Logout failed",
            UpdateProfile => "Failed to update profile",
            ChangePassword => "Failed to change password",
            ForgotPassword => "Failed to request password reset",
            ResetPassword => "Failed to reset password",
            UpdateWorkspace { .. } => "Failed to update workspace",
            InviteMember { .. } => "Failed to invite member",
            UpdateMemberRole { .. } => "Failed to update member",
            RemoveMember { .. } => "Failed to remove member",
            CreateShow { .. } => "Failed to create show",
            UpdateShow { .. } => "Update failed",
            DeleteShow { .. } => "Failed to archive show",
            GenerateEpisode { .. } => "Failed to generate episode",
            CreateEpisode { .. } => "Failed to create episode",
            UpdateEpisode { .. } => "Failed to update episode",
            DeleteEpisode { .. } => "Failed to delete episode",
            ApproveEpisode { .. } => "Approval failed",
            RejectEpisode { .. } => "Rejection failed",
            QueueRender { .. } => "Failed to queue render",
            GenerateScenes { .. } => "Failed to generate scenes",
            CreateCharacter { .. } => "Failed to create character",
            UpdateCharacter { .. } => "Update failed",
            DeleteCharacter { .. } => "Delete failed",
            GenerateCharacterPrompts { .. } => "Failed to generate prompts",
            CreateScene { .. } => "Failed to create scene",
            UpdateScene { .. } => "Failed to update scene",
            DeleteScene { .. } => "Failed to delete scene",
            CreateVoiceActor { .. } => "Failed to create voice actor",
            UpdateVoiceActor { .. } => "Failed to update voice actor",
            DeleteVoiceActor { .. } => "Failed to remove voice actor",
            UpdateShowProduction { .. } => "Failed to save production profile",
            UpdateCharacterVoice { .. } => "Failed to save voice assignment",
            UploadEmotionRef { .. } => "Failed to upload emotion reference",
            UpdateEmotionRef { .. } => "Failed to update emotion reference",
            DeleteEmotionRef { .. } => "Failed to remove emotion reference",
            MarkNotificationRead => "Failed to mark notification as read",
            MarkAllNotificationsRead => "Failed to mark notifications as read",
            StartCheckout { .. } => "Failed to start checkout",
            OpenBillingPortal { .. } => "Failed to open billing portal",
            CancelSubscription { .. } => "Failed to cancel subscription",
            CancelRenderJob => "Failed to cancel render job",
        }
    }
}

// ---------------------------------------------------------------------------
// In-flight guard
// ---------------------------------------------------------------------------

/// Names of actions currently running. Acquiring a name that is already
/// held fails with [`ClientError::MutationPending`].
#[derive(Debug, Default, Clone)]
pub struct InFlight {
    held: Arc<Mutex<HashSet<String>>>,
}

impl InFlight {
    pub fn try_acquire(&self, slot: String, action: &'static str) -> Result<InFlightGuard, ClientError> {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        if !held.insert(slot.clone()) {
            tracing::debug!(slot = %slot, action, "Action already in progress");
            return Err(ClientError::MutationPending(action));
        }
        Ok(InFlightGuard {
            held: self.held.clone(),
            slot,
        })
    }

    pub fn is_held(&self, slot: &str) -> bool {
        self.held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(slot)
    }
}

/// Releases its slot on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    held: Arc<Mutex<HashSet<String>>>,
    slot: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.slot);
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

impl StudioClient {
    /// Run a write. On success the mutation's prefixes are invalidated
    /// (observed keys are refetched before this returns) and the success
    /// toast is raised. On failure an error toast is raised and the error is
    /// returned; a plan limit also opens the upgrade modal, and a missing or
    /// conflicting target invalidates the same prefixes as a success would.
    pub(crate) async fn mutate<T, Fut>(&self, mutation: Mutation, request: Fut) -> Result<T, ClientError>
    where
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let result = request.await;
        match &result {
            Ok(_) => {
                tracing::info!(mutation = mutation.name(), "Mutation succeeded");
                for prefix in mutation.invalidates() {
                    self.queries.invalidate_queries(&prefix).await;
                }
                if let Some(message) = mutation.success_message() {
                    self.notifier.notify(Toast::success(message));
                }
            }
            Err(e) => {
                self.report_failure(&mutation, e);
                if e.is_stale_reference() {
                    for prefix in mutation.invalidates() {
                        self.queries.invalidate_queries(&prefix).await;
                    }
                }
            }
        }
        result
    }

    fn report_failure(&self, mutation: &Mutation, error: &ClientError) {
        tracing::warn!(mutation = mutation.name(), error = %error, "Mutation failed");
        if let ClientError::PlanLimit { resource, .. } = error {
            self.stores.ui.open_upgrade_modal(Some(resource.clone()));
        }
        self.notifier
            .notify(Toast::error(error.user_message(mutation.failure_message())));
    }
}
