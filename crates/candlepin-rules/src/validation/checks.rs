//! The individual pre-entitlement checks.
//!
//! The global check always runs first. Every other check runs only when the
//! pool (or its product) carries the attribute that triggers it, in the
//! order of [`ATTRIBUTE_CHECKS`].

use candlepin_core::types::attribute::{facts, names};
use candlepin_core::types::{CallerType, ConsumerTypeLabel, ProductAttribute};
use candlepin_core::util::{equals_ignore_case, parse_int};
use candlepin_entity::Pool;
use tracing::trace;

use super::context::ValidationContext;
use super::result::ValidationResult;
use crate::arch::architecture_matches;
use crate::facts::consumer_value;

const MANIFEST_UNAVAILABLE: &str = "pool.not.available.to.manifest.consumers";

/// A single pre-entitlement check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Check {
    Global,
    Architecture,
    Sockets,
    Ram,
    Cores,
    RequiresConsumerType,
    VirtOnly,
    RequiresHost,
    InstanceMultiplier,
    Vcpu,
    PhysicalOnly,
    UnmappedGuestsOnly,
    StorageBand,
    RequiresConsumer,
}

/// Attribute-triggered checks in evaluation order.
pub const ATTRIBUTE_CHECKS: [Check; 13] = [
    Check::Architecture,
    Check::Sockets,
    Check::Ram,
    Check::Cores,
    Check::RequiresConsumerType,
    Check::VirtOnly,
    Check::RequiresHost,
    Check::InstanceMultiplier,
    Check::Vcpu,
    Check::PhysicalOnly,
    Check::UnmappedGuestsOnly,
    Check::StorageBand,
    Check::RequiresConsumer,
];

impl Check {
    /// The attribute whose presence enables this check. `None` for the
    /// global check, which always runs.
    pub fn trigger(&self) -> Option<&'static str> {
        let name = match self {
            Self::Global => return None,
            Self::Architecture => ProductAttribute::Arch.as_str(),
            Self::Sockets => ProductAttribute::Sockets.as_str(),
            Self::Ram => ProductAttribute::Ram.as_str(),
            Self::Cores => ProductAttribute::Cores.as_str(),
            Self::Vcpu => ProductAttribute::Vcpu.as_str(),
            Self::StorageBand => ProductAttribute::StorageBand.as_str(),
            Self::RequiresConsumerType => names::REQUIRES_CONSUMER_TYPE,
            Self::VirtOnly => names::VIRT_ONLY,
            Self::RequiresHost => names::REQUIRES_HOST,
            Self::InstanceMultiplier => names::INSTANCE_MULTIPLIER,
            Self::PhysicalOnly => names::PHYSICAL_ONLY,
            Self::UnmappedGuestsOnly => names::UNMAPPED_GUESTS_ONLY,
            Self::RequiresConsumer => names::REQUIRES_CONSUMER,
        };
        Some(name)
    }

    /// The checks that apply to `pool`, global first.
    pub fn for_pool(pool: &Pool) -> Vec<Check> {
        std::iter::once(Check::Global)
            .chain(
                ATTRIBUTE_CHECKS
                    .into_iter()
                    .filter(|check| check.trigger().is_some_and(|name| pool.has_attribute(name))),
            )
            .collect()
    }

    /// Run the check, appending any findings to `result`.
    pub fn run(&self, ctx: &ValidationContext<'_>, result: &mut ValidationResult) {
        trace!(check = ?self, pool_id = %ctx.pool.id, "running pre-entitlement check");
        match self {
            Self::Global => global(ctx, result),
            Self::Architecture => architecture(ctx, result),
            Self::Sockets => sockets(ctx, result),
            Self::Ram => ram(ctx, result),
            Self::Cores => cores(ctx, result),
            Self::RequiresConsumerType => requires_consumer_type(ctx, result),
            Self::VirtOnly => virt_only(ctx, result),
            Self::RequiresHost => requires_host(ctx, result),
            Self::InstanceMultiplier => instance_multiplier(ctx, result),
            Self::Vcpu => vcpu(ctx, result),
            Self::PhysicalOnly => physical_only(ctx, result),
            Self::UnmappedGuestsOnly => unmapped_guests_only(ctx, result),
            Self::StorageBand => storage_band(ctx, result),
            Self::RequiresConsumer => requires_consumer(ctx, result),
        }
    }
}

/// Whether the pool's product is not part of any stack. Stacked pools are
/// sized by quantity, so capacity warnings do not apply to them.
fn is_unstacked(pool: &Pool) -> bool {
    pool.product_attribute(names::STACKING_ID)
        .filter(|v| !v.is_empty())
        .is_none()
}

/// Manifest consumers must declare support for an attribute before they
/// can export pools that use it.
fn require_capability(
    ctx: &ValidationContext<'_>,
    result: &mut ValidationResult,
    capability: &str,
    key: &str,
) {
    if !ctx.consumer.is_capable(capability) {
        result.add_for_caller(
            ctx.is_binding(),
            &format!("rulefailed.{key}.unsupported.by.consumer"),
            &format!("rulewarning.{key}.unsupported.by.consumer"),
        );
    }
}

/// Warn when a single unstacked pool covers less than the consumer has.
fn capacity_warning(
    ctx: &ValidationContext<'_>,
    result: &mut ValidationResult,
    attr: ProductAttribute,
    key: &str,
) {
    let consumer_value = consumer_value(attr, ctx.consumer);
    if consumer_value == 0 || !is_unstacked(ctx.pool) {
        return;
    }
    if let Some(pool_value) = ctx.pool.product_attribute_int(attr.as_str()) {
        if pool_value > 0 && pool_value < consumer_value {
            result.add_warning(key);
        }
    }
}

fn global(ctx: &ValidationContext<'_>, result: &mut ValidationResult) {
    let consumer = ctx.consumer;
    let pool = ctx.pool;

    if consumer.is_manifest() {
        if pool.derived_product_id.is_some() {
            require_capability(ctx, result, names::DERIVED_PRODUCT_CAPABILITY, "derivedproduct");
        }
        return;
    }

    if ctx.has_entitlement(pool.id.as_str()) && !pool.is_multi_ent() {
        result.add_error("rulefailed.consumer.already.has.product");
    }

    if ctx.quantity > 1 && !pool.is_multi_ent() {
        result.add_error("rulefailed.pool.does.not.support.multi-entitlement");
    }

    // Pools without a required type are for systems; hypervisors count as
    // systems and uebercerts see everything.
    let untyped = pool
        .product_attribute(names::REQUIRES_CONSUMER_TYPE)
        .filter(|v| !v.is_empty())
        .is_none();
    if untyped {
        let label = consumer.consumer_type.label.as_str();
        let system_like = [
            ConsumerTypeLabel::System,
            ConsumerTypeLabel::Hypervisor,
            ConsumerTypeLabel::Uebercert,
        ]
        .iter()
        .any(|t| t.matches(label));
        if !system_like {
            result.add_error("rulefailed.consumer.type.mismatch");
        }
    }

    if let Some(restricted) = &pool.restricted_to_username {
        if consumer.username.as_deref() != Some(restricted.as_str()) {
            result.add_error("pool.not.available.to.user");
        }
    }
}

fn architecture(ctx: &ValidationContext<'_>, result: &mut ValidationResult) {
    let consumer = ctx.consumer;
    if consumer.is_manifest() {
        return;
    }
    let matches = architecture_matches(
        ctx.pool.product_attribute(ProductAttribute::Arch.as_str()),
        consumer.fact(facts::ARCH),
        &consumer.consumer_type.label,
    );
    if !matches {
        result.add_warning("rulewarning.architecture.mismatch");
    }
}

fn sockets(ctx: &ValidationContext<'_>, result: &mut ValidationResult) {
    let consumer = ctx.consumer;
    if consumer.is_manifest() || consumer.is_guest() {
        return;
    }
    // An unreported socket count skips the comparison rather than
    // defaulting to one socket.
    let Some(consumer_sockets) = consumer.non_empty_fact(facts::SOCKETS).and_then(parse_int) else {
        return;
    };
    if !is_unstacked(ctx.pool) {
        return;
    }
    if let Some(pool_sockets) = ctx.pool.product_attribute_int(ProductAttribute::Sockets.as_str()) {
        if pool_sockets > 0 && pool_sockets < consumer_sockets {
            result.add_warning("rulewarning.unsupported.number.of.sockets");
        }
    }
}

fn cores(ctx: &ValidationContext<'_>, result: &mut ValidationResult) {
    let consumer = ctx.consumer;
    if consumer.is_manifest() {
        require_capability(ctx, result, ProductAttribute::Cores.as_str(), "cores");
    } else if !consumer.is_guest() {
        capacity_warning(
            ctx,
            result,
            ProductAttribute::Cores,
            "rulewarning.unsupported.number.of.cores",
        );
    }
}

fn vcpu(ctx: &ValidationContext<'_>, result: &mut ValidationResult) {
    let consumer = ctx.consumer;
    if !consumer.is_manifest() && consumer.is_guest() {
        capacity_warning(
            ctx,
            result,
            ProductAttribute::Vcpu,
            "rulewarning.unsupported.number.of.vcpus",
        );
    }
}

/// RAM and storage band warn whenever the consumer exceeds the product.
fn exceeds_product(ctx: &ValidationContext<'_>, attr: ProductAttribute) -> bool {
    let consumer_value = consumer_value(attr, ctx.consumer);
    match ctx.pool.product_attribute_int(attr.as_str()) {
        Some(product_value) => consumer_value > product_value && is_unstacked(ctx.pool),
        None => false,
    }
}

fn ram(ctx: &ValidationContext<'_>, result: &mut ValidationResult) {
    if ctx.consumer.is_manifest() {
        require_capability(ctx, result, ProductAttribute::Ram.as_str(), "ram");
    } else if exceeds_product(ctx, ProductAttribute::Ram) {
        result.add_warning("rulewarning.unsupported.ram");
    }
}

fn storage_band(ctx: &ValidationContext<'_>, result: &mut ValidationResult) {
    if ctx.consumer.is_manifest() {
        require_capability(ctx, result, ProductAttribute::StorageBand.as_str(), "storageband");
    } else if exceeds_product(ctx, ProductAttribute::StorageBand) {
        result.add_warning("rulewarning.unsupported.storageband");
    }
}

fn instance_multiplier(ctx: &ValidationContext<'_>, result: &mut ValidationResult) {
    let consumer = ctx.consumer;
    if consumer.is_manifest() {
        require_capability(ctx, result, names::INSTANCE_MULTIPLIER, "instance");
        return;
    }
    // Only physical binds must take whole multiples of the multiplier.
    if ctx.caller != CallerType::Bind || consumer.is_guest() {
        return;
    }
    let divisible = match ctx.pool.product_attribute_int(names::INSTANCE_MULTIPLIER) {
        Some(multiplier) if multiplier != 0 => ctx.quantity % multiplier == 0,
        _ => false,
    };
    if !divisible {
        result.add_error("rulefailed.quantity.mismatch");
    }
}

fn requires_consumer_type(ctx: &ValidationContext<'_>, result: &mut ValidationResult) {
    let consumer = ctx.consumer;
    if consumer.is_manifest() {
        return;
    }
    let label = consumer.consumer_type.label.as_str();
    let Some(required) = ctx.attribute(names::REQUIRES_CONSUMER_TYPE) else {
        return;
    };
    if ConsumerTypeLabel::Uebercert.matches(label) || required == label {
        return;
    }
    let hypervisor_as_system =
        ConsumerTypeLabel::System.matches(required) && ConsumerTypeLabel::Hypervisor.matches(label);
    if !hypervisor_as_system {
        result.add_error("rulefailed.consumer.type.mismatch");
    }
}

fn virt_only(ctx: &ValidationContext<'_>, result: &mut ValidationResult) {
    let consumer = ctx.consumer;
    if !equals_ignore_case(ctx.attribute(names::VIRT_ONLY), Some("true")) {
        return;
    }
    if consumer.is_manifest() {
        if equals_ignore_case(ctx.attribute(names::POOL_DERIVED), Some("true")) {
            result.add_error(MANIFEST_UNAVAILABLE);
        }
    } else if !consumer.is_guest() {
        result.add_for_caller(ctx.is_binding(), "rulefailed.virt.only", "rulewarning.virt.only");
    }
}

fn physical_only(ctx: &ValidationContext<'_>, result: &mut ValidationResult) {
    let consumer = ctx.consumer;
    if equals_ignore_case(ctx.attribute(names::PHYSICAL_ONLY), Some("true"))
        && !consumer.is_manifest()
        && consumer.is_guest()
    {
        result.add_for_caller(
            ctx.is_binding(),
            "rulefailed.physical.only",
            "rulewarning.physical.only",
        );
    }
}

fn unmapped_guests_only(ctx: &ValidationContext<'_>, result: &mut ValidationResult) {
    if !equals_ignore_case(ctx.attribute(names::UNMAPPED_GUESTS_ONLY), Some("true")) {
        return;
    }
    // Errors rather than warnings hide these temporary pools from listings.
    if ctx.host_consumer.is_some() {
        result.add_error("virt.guest.cannot.use.unmapped.guest.pool.has.host");
    }
    if !ctx.consumer.is_newborn(ctx.now, ctx.newborn_window) {
        result.add_error("virt.guest.cannot.use.unmapped.guest.pool.not.new");
    }
    if ctx.caller == CallerType::Bind && ctx.pool.start_date > ctx.now {
        result.add_error("virt.guest.cannot.bind.future.unmapped.guest.pool");
    }
}

fn requires_host(ctx: &ValidationContext<'_>, result: &mut ValidationResult) {
    let consumer = ctx.consumer;
    if consumer.is_manifest() {
        result.add_error(MANIFEST_UNAVAILABLE);
        return;
    }
    if consumer.non_empty_fact(facts::VIRT_UUID).is_none() {
        result.add_error("rulefailed.virt.only");
        return;
    }
    let required = ctx.attribute(names::REQUIRES_HOST);
    let host_matches = ctx
        .host_consumer
        .is_some_and(|host| Some(host.uuid.as_str()) == required);
    if !host_matches {
        result.add_error("virt.guest.host.does.not.match.pool.owner");
    }
}

fn requires_consumer(ctx: &ValidationContext<'_>, result: &mut ValidationResult) {
    let required = ctx.attribute(names::REQUIRES_CONSUMER);
    if ctx.consumer.is_manifest() && required.is_some() {
        result.add_error(MANIFEST_UNAVAILABLE);
        return;
    }
    if required != Some(ctx.consumer.uuid.as_str()) {
        result.add_error("consumer.does.not.match.pool.consumer.requirement");
    }
}
