//! Storage account flow: resource group, name, location, SKU, create

use std::time::Instant;
use futures::future::BoxFuture;
use tracing::warn;

use crate::state::FrameValue;
use crate::utils::errors::Result;
use crate::utils::logging::log_provider_call;
use super::flow::{FlowDefinition, StepContext, StepOutcome};
use super::prompt::{Prompt, TextValidation};

pub const STORAGE_ACCOUNT_DIALOG: &str = "storage_account";

pub fn storage_account_flow() -> FlowDefinition {
    FlowDefinition::new(STORAGE_ACCOUNT_DIALOG)
        .step("resource_group", resource_group_step)
        .step("name", name_step)
        .step("location", location_step)
        .step("sku", sku_step)
        .step("create", create_step)
}

fn resource_group_step(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepOutcome>> {
    Box::pin(async move {
        let filter = ctx.options().resource_group_filter.clone();

        let started = Instant::now();
        let listed = ctx.provider().list_resource_groups(filter.as_deref()).await;
        log_provider_call(
            "list_resource_groups",
            filter.as_deref().unwrap_or("*"),
            started.elapsed().as_millis() as u64,
            listed.is_ok(),
        );

        let groups = match listed {
            Ok(groups) => groups,
            Err(e) => {
                ctx.send(format!("An error occurred listing resource groups. Message {}", e));
                return Ok(StepOutcome::EndDialog(None));
            }
        };

        if groups.is_empty() {
            warn!(conversation = %ctx.conversation(), filter = ?filter, "No resource groups to offer");
            ctx.send("There are no resource groups available for a storage account.");
            return Ok(StepOutcome::EndDialog(None));
        }

        Ok(StepOutcome::Prompt(Prompt::choice(
            "Which resource group would you like to deploy the storage account into?",
            groups.into_iter().map(|group| group.name).collect(),
        )))
    })
}

fn name_step(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepOutcome>> {
    Box::pin(async move {
        let resource_group = ctx.result_text()?;
        ctx.set_value("resource_group", resource_group);

        Ok(StepOutcome::Prompt(Prompt::validated_text(
            "Enter the storage account name.",
            TextValidation::storage_account_name(),
        )))
    })
}

fn location_step(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepOutcome>> {
    Box::pin(async move {
        let name = ctx.result_text()?;
        ctx.set_value("name", name);

        Ok(StepOutcome::Prompt(Prompt::choice(
            "Enter the azure location.",
            ctx.options().locations.clone(),
        )))
    })
}

fn sku_step(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepOutcome>> {
    Box::pin(async move {
        let location = ctx.result_text()?;
        ctx.set_value("location", location);

        Ok(StepOutcome::Prompt(Prompt::choice(
            "Pick a sku for the storage account.",
            ctx.options().storage_skus.clone(),
        )))
    })
}

fn create_step(ctx: &mut StepContext) -> BoxFuture<'_, Result<StepOutcome>> {
    Box::pin(async move {
        let sku = ctx.result_text()?;
        ctx.set_value("sku", sku.clone());

        let name = ctx.value_text("name")?;
        let resource_group = ctx.value_text("resource_group")?;
        let location = ctx.value_text("location")?;

        ctx.send(format!("Creating Storage Account {} in {}", name, resource_group));

        let started = Instant::now();
        let created = ctx
            .provider()
            .create_storage_account(&name, &resource_group, &location, &sku)
            .await;
        log_provider_call(
            "create_storage_account",
            &name,
            started.elapsed().as_millis() as u64,
            created.is_ok(),
        );

        match created {
            Ok(handle) => {
                ctx.send(format!("Storage account {} created at {}.", name, handle.id));
                Ok(StepOutcome::EndDialog(Some(FrameValue::from(handle.id))))
            }
            Err(e) => {
                ctx.send(format!(
                    "An error occurred creating storage account {}. Message {}",
                    name, e
                ));
                Ok(StepOutcome::EndDialog(None))
            }
        }
    })
}
