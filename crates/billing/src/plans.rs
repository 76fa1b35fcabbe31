//! Subscription plan catalog.
//!
//! Prices are in BRL cents. The Stripe price IDs must match the products
//! configured in the Stripe dashboard.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BillingError;

/// Credits granted by a weekly subscription to a finite plan.
pub const WEEKLY_CREDITS: i64 = 50;

/// `credits` value marking an unlimited plan.
pub const UNLIMITED: i64 = -1;

/// Billing interval of a paid plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    Weekly,
    Monthly,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Weekly => "weekly",
            Interval::Monthly => "monthly",
        }
    }

    /// Label shown to customers.
    pub fn label(&self) -> &'static str {
        match self {
            Interval::Weekly => "Semanal",
            Interval::Monthly => "Mensal",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weekly" => Ok(Interval::Weekly),
            "monthly" => Ok(Interval::Monthly),
            other => Err(BillingError::InvalidPlan(format!("unknown interval '{other}'"))),
        }
    }
}

/// A purchasable plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub price_weekly: i64,
    pub price_monthly: i64,
    #[serde(skip)]
    pub stripe_price_id_weekly: &'static str,
    #[serde(skip)]
    pub stripe_price_id_monthly: &'static str,
    pub features: &'static [&'static str],
    /// Monthly credit grant, or [`UNLIMITED`].
    pub credits: i64,
    pub popular: bool,
}

/// All plans, cheapest first.
pub static PLANS: &[Plan] = &[
    Plan {
        id: "free",
        name: "Grátis",
        description: "Para testar",
        price_weekly: 0,
        price_monthly: 0,
        stripe_price_id_weekly: "",
        stripe_price_id_monthly: "",
        features: &[
            "10 mensagens grátis",
            "Todos os tons de voz",
            "Upload de imagem",
        ],
        credits: 10,
        popular: false,
    },
    Plan {
        id: "pro",
        name: "Pro",
        description: "Para uso regular",
        price_weekly: 990,
        price_monthly: 2990,
        stripe_price_id_weekly: "price_1SUDL5GYEWk0KjWQPBVgRk5A",
        stripe_price_id_monthly: "price_1SUDLbGYEWk0KjWQUYJqOuR3",
        features: &[
            "50 mensagens/semana ou 200/mês",
            "Histórico ilimitado",
            "Favoritos ilimitados",
        ],
        credits: 200,
        popular: true,
    },
    Plan {
        id: "premium",
        name: "Premium",
        description: "Para uso intenso",
        price_weekly: 1990,
        price_monthly: 5990,
        stripe_price_id_weekly: "price_1SUDLzGYEWk0KjWQWXZuCKv0",
        stripe_price_id_monthly: "price_1SUDMMGYEWk0KjWQc0iOPAfh",
        features: &[
            "Mensagens ilimitadas",
            "Prioridade na geração",
            "Suporte prioritário",
            "Novos recursos primeiro",
        ],
        credits: UNLIMITED,
        popular: false,
    },
];

/// Look up a plan by ID.
pub fn find_plan(id: &str) -> Option<&'static Plan> {
    PLANS.iter().find(|p| p.id == id)
}

/// Composite key stored on a subscription, e.g. `pro_monthly`.
pub fn plan_key(plan_id: &str, interval: Interval) -> String {
    format!("{}_{}", plan_id, interval)
}

/// Format cents as Brazilian reais, e.g. `2990` -> `R$ 29,90`.
pub fn format_price(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.abs();
    format!("{}R$ {},{:02}", sign, cents / 100, cents % 100)
}

impl Plan {
    /// Stripe price for the interval. `None` for plans that are not sold.
    pub fn price_id(&self, interval: Interval) -> Option<&'static str> {
        let id = match interval {
            Interval::Weekly => self.stripe_price_id_weekly,
            Interval::Monthly => self.stripe_price_id_monthly,
        };
        (!id.is_empty()).then_some(id)
    }

    /// Price in cents for the interval.
    pub fn price(&self, interval: Interval) -> i64 {
        match interval {
            Interval::Weekly => self.price_weekly,
            Interval::Monthly => self.price_monthly,
        }
    }

    /// Whether the plan has no credit limit.
    pub fn is_unlimited(&self) -> bool {
        self.credits == UNLIMITED
    }

    /// Credits granted by a purchase of this plan for the interval.
    ///
    /// Every weekly purchase gets the fixed [`WEEKLY_CREDITS`], including
    /// plans that are unlimited when bought monthly.
    pub fn credits_for(&self, interval: Interval) -> i64 {
        match interval {
            Interval::Weekly => WEEKLY_CREDITS,
            Interval::Monthly => self.credits,
        }
    }

    /// Ledger description of a purchase, e.g. `Assinatura Pro - Mensal`.
    pub fn purchase_description(&self, interval: Interval) -> String {
        format!("Assinatura {} - {}", self.name, interval.label())
    }
}
