use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::user::User;

/// Tier as seen by the template quota
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateTier {
    Guest,
    Free,
    Premium,
    Subscription,
}

impl TemplateTier {
    /// Subscription beats credit; credit beats free
    pub fn resolve(user: &User, now: DateTime<Utc>) -> Self {
        if user.has_active_subscription(now) {
            Self::Subscription
        } else if user.credit_balance() > 0 {
            Self::Premium
        } else {
            Self::Free
        }
    }
}

/// Per-tier quota: the first `free_count` templates cost nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateQuota {
    /// `None` means unlimited
    pub free_count: Option<u64>,
    pub credit_cost: i64,
    pub message: &'static str,
}

impl TemplateQuota {
    pub fn for_tier(tier: TemplateTier) -> Self {
        match tier {
            TemplateTier::Guest => Self {
                free_count: Some(1),
                credit_cost: 0,
                message: "Guests can save 1 template. Sign up to save more.",
            },
            TemplateTier::Free => Self {
                free_count: Some(3),
                credit_cost: 1,
                message: "Free users can save 3 templates; each additional template costs 1 credit.",
            },
            TemplateTier::Premium => Self {
                free_count: Some(3),
                credit_cost: 1,
                message: "The first 3 templates are free; each additional template costs 1 credit.",
            },
            TemplateTier::Subscription => Self {
                free_count: None,
                credit_cost: 0,
                message: "Subscribers can save unlimited templates.",
            },
        }
    }
}

/// Outcome of the quota check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDecision {
    pub allowed: bool,
    pub requires_credit: bool,
    pub cost: i64,
    pub message: String,
}

pub fn can_create_template(
    tier: TemplateTier,
    current_count: u64,
    credit_balance: i64,
) -> TemplateDecision {
    let quota = TemplateQuota::for_tier(tier);

    let within_free = quota
        .free_count
        .map(|free| current_count < free)
        .unwrap_or(true);

    if within_free {
        return TemplateDecision {
            allowed: true,
            requires_credit: false,
            cost: 0,
            message: quota.message.to_string(),
        };
    }

    match tier {
        TemplateTier::Guest => TemplateDecision {
            allowed: false,
            requires_credit: false,
            cost: 0,
            message: "Guests can save only 1 template. Please sign up to save more.".to_string(),
        },
        TemplateTier::Subscription => TemplateDecision {
            allowed: true,
            requires_credit: false,
            cost: 0,
            message: quota.message.to_string(),
        },
        TemplateTier::Free | TemplateTier::Premium => {
            let cost = quota.credit_cost;

            if credit_balance >= cost {
                TemplateDecision {
                    allowed: true,
                    requires_credit: true,
                    cost,
                    message: format!("{} credit(s) will be used to save this template.", cost),
                }
            } else {
                TemplateDecision {
                    allowed: false,
                    requires_credit: true,
                    cost,
                    message: "Insufficient credits to save more templates. Please purchase credits."
                        .to_string(),
                }
            }
        }
    }
}
