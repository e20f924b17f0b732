use std::collections::{BTreeSet, HashMap};

use tracing::{info, warn};

use unimig_core::alertmanager::{
    select_contacts, AlertmanagerConfig, Integration, ModelDuration, Receiver, ReceiverNames,
    Route, DEFAULT_RECEIVER_NAME, DISABLED_REPEAT_INTERVAL,
};
use unimig_core::channel::ChannelType;
use unimig_core::error::DomainError;
use unimig_core::ids::UidClaim;
use unimig_core::legacy::{ChannelRef, LegacyChannel};
use unimig_ports::outbound::SecretsService;

use crate::context::MigrationContext;
use crate::error::AppError;
use crate::settings::SettingsTranscoder;

/// The org's alertmanager config plus the lookups rules need to be routed
/// through it.
#[derive(Debug, Clone)]
pub struct ReceiverPlan {
    pub config: AlertmanagerConfig,
    /// Receiver name for every id and uid a legacy alert may reference.
    pub receivers_by_ref: HashMap<ChannelRef, String>,
    /// Migrated integration UID for every channel reference.
    pub integration_uids: HashMap<ChannelRef, String>,
    /// Receivers of the channels flagged as default.
    pub defaults: BTreeSet<String>,
}

impl ReceiverPlan {
    /// Contact label value for a rule, `None` when the root route covers it.
    pub fn contact_label(&self, rule_title: &str, refs: &[ChannelRef]) -> Option<String> {
        let selection = select_contacts(refs, &self.receivers_by_ref, &self.defaults);
        for channel in &selection.unresolved {
            warn!(
                rule = rule_title,
                channel = %channel,
                "alert linked to obsolete notification channel, ignoring"
            );
        }
        selection.label_value()
    }

    /// Integration UIDs of the channels a rule references, without
    /// duplicates.
    pub fn channel_uids(&self, refs: &[ChannelRef]) -> Vec<String> {
        let uids: BTreeSet<&String> = refs
            .iter()
            .filter_map(|r| self.integration_uids.get(r))
            .collect();
        uids.into_iter().cloned().collect()
    }
}

fn repeat_interval(channel: &LegacyChannel) -> ModelDuration {
    if channel.send_reminder {
        ModelDuration(channel.frequency)
    } else {
        DISABLED_REPEAT_INTERVAL
    }
}

pub struct ReceiverBuilder<'a, S: SecretsService> {
    transcoder: SettingsTranscoder<'a, S>,
}

impl<'a, S: SecretsService> ReceiverBuilder<'a, S> {
    pub fn new(secrets: &'a S) -> Self {
        Self {
            transcoder: SettingsTranscoder::new(secrets),
        }
    }

    fn channel_uid(ctx: &mut MigrationContext, channel: &LegacyChannel) -> Result<String, AppError> {
        let uid = match ctx.seen_uids.claim(&channel.uid)? {
            UidClaim::Reused(uid) => uid,
            UidClaim::ReplacedEmpty(uid) => {
                info!(id = channel.id, uid = %uid, "legacy notification had an empty uid, generating a new one");
                uid
            }
            UidClaim::ReplacedCollision(uid) => {
                warn!(
                    id = channel.id,
                    old = %channel.uid,
                    new = %uid,
                    "legacy notification uid collides with a migrated record, generating a new one"
                );
                uid
            }
        };
        Ok(uid)
    }

    async fn integration(
        &self,
        channel: &LegacyChannel,
        name: &str,
        uid: String,
    ) -> Result<Integration, AppError> {
        let transcoded = self
            .transcoder
            .transcode(&channel.kind, &channel.settings, &channel.secure_settings)
            .await?;

        Ok(Integration {
            uid,
            name: name.to_string(),
            kind: channel.kind.clone(),
            disable_resolve_message: channel.disable_resolve_message,
            settings: transcoded.settings,
            secure_settings: transcoded.secure_settings,
        })
    }

    /// One receiver and one child route per channel, under a root route
    /// that always exists.
    pub async fn build(
        &self,
        ctx: &mut MigrationContext,
        channels: &[LegacyChannel],
    ) -> Result<ReceiverPlan, AppError> {
        let mut names = ReceiverNames::default();
        let mut receivers = Vec::with_capacity(channels.len() + 1);
        let mut routes = Vec::with_capacity(channels.len());
        let mut receivers_by_ref = HashMap::new();
        let mut integration_uids = HashMap::new();
        let mut defaults = BTreeSet::new();
        let mut default_channels = Vec::new();

        for channel in channels {
            let (name, renamed) = names.claim(&channel.name);
            if renamed {
                warn!(
                    kind = %channel.kind,
                    name = %channel.name,
                    new_name = %name,
                    uid = %channel.uid,
                    "duplicate contact name after sanitization, appending unique suffix"
                );
            }
            let uid = Self::channel_uid(ctx, channel)?;
            let integration = self.integration(channel, &name, uid).await?;

            for r in channel.refs() {
                receivers_by_ref.insert(r.clone(), name.clone());
                integration_uids.insert(r, integration.uid.clone());
            }
            if channel.is_default {
                defaults.insert(name.clone());
                default_channels.push((channel, name.clone()));
            }

            routes.push(Route::for_contact(&name, repeat_interval(channel))?);
            receivers.push(Receiver::new(name, vec![integration]));
        }

        let mut root = match default_channels.as_slice() {
            [] => {
                let (name, _) = names.claim(DEFAULT_RECEIVER_NAME);
                receivers.push(Receiver::new(name.clone(), Vec::new()));
                Route::root(name, None)
            }
            [(channel, name)] => Route::root(name.clone(), Some(repeat_interval(channel))),
            many => {
                // a dedicated receiver keeps the root route single-receiver
                let (name, _) = names.claim(DEFAULT_RECEIVER_NAME);
                let mut integrations = Vec::with_capacity(many.len());
                let mut interval = DISABLED_REPEAT_INTERVAL;
                for (channel, channel_name) in many {
                    // fresh UIDs, the channel's own integration already uses its UID
                    let uid = ctx.seen_uids.generate()?;
                    integrations.push(self.integration(channel, channel_name, uid).await?);
                    if channel.send_reminder && ModelDuration(channel.frequency) < interval {
                        interval = ModelDuration(channel.frequency);
                    }
                }
                receivers.push(Receiver::new(name.clone(), integrations));
                Route::root(name, Some(interval))
            }
        };
        root.routes = routes;

        Ok(ReceiverPlan {
            config: AlertmanagerConfig::new(root, receivers),
            receivers_by_ref,
            integration_uids,
            defaults,
        })
    }
}

/// Builds every integration's settings the way the notifier would,
/// rejecting the config on the first unknown type or missing field.
pub fn validate(config: &AlertmanagerConfig) -> Result<(), AppError> {
    for receiver in config.receivers() {
        for integration in &receiver.grafana_managed_receiver_configs {
            let invalid = |source: DomainError| AppError::InvalidReceiver {
                receiver: receiver.name.clone(),
                source,
            };
            let kind = ChannelType::parse(&integration.kind).ok_or_else(|| {
                invalid(DomainError::UnsupportedNotifier(integration.kind.clone()))
            })?;
            let settings = integration.settings.as_object().ok_or_else(|| {
                invalid(DomainError::InvalidSettings(format!(
                    "settings of {} are not an object",
                    integration.name
                )))
            })?;
            kind.validate(settings, &integration.secure_settings)
                .map_err(invalid)?;
        }
    }
    Ok(())
}
