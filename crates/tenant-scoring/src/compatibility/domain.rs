use serde::{Deserialize, Serialize};

/// Identifier wrapper for property owners (the tenants of the platform).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OwnerId(pub String);

/// Identifier wrapper for submitted rental applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Identifier wrapper for listed properties.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertyId(pub String);

macro_rules! impl_id_display {
    ($($ty:ty),*) => {
        $(
            impl std::fmt::Display for $ty {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    f.write_str(&self.0)
                }
            }
        )*
    };
}

impl_id_display!(OwnerId, ApplicationId, PropertyId);

/// Read-only applicant snapshot supplied by the application provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalApplication {
    pub id: ApplicationId,
    pub monthly_income: Option<f64>,
    pub contract_type: Option<ContractType>,
    #[serde(default)]
    pub seniority_months: u32,
    #[serde(default)]
    pub in_trial_period: bool,
    pub guarantor: Option<Guarantor>,
    pub documents: DocumentChecklist,
    pub household: Household,
}

/// Employment situation of the main applicant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractType {
    PermanentConfirmed,
    PermanentTrial,
    FixedTermLong,
    FixedTermShort,
    Freelance,
    Student,
    Unemployed,
    Retired,
    CivilServant,
}

impl ContractType {
    pub const fn label(self) -> &'static str {
        match self {
            ContractType::PermanentConfirmed => "confirmed permanent contract",
            ContractType::PermanentTrial => "permanent contract in trial",
            ContractType::FixedTermLong => "long fixed-term contract",
            ContractType::FixedTermShort => "short fixed-term contract",
            ContractType::Freelance => "freelance",
            ContractType::Student => "student",
            ContractType::Unemployed => "unemployed",
            ContractType::Retired => "retired",
            ContractType::CivilServant => "civil servant",
        }
    }
}

/// Person or organisation standing surety for the rent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guarantor {
    pub kind: GuarantorKind,
    pub monthly_income: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuarantorKind {
    Individual,
    PublicScheme,
    Company,
    BankDeposit,
}

/// Supporting documents attached to the rental file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocumentChecklist {
    pub identity: bool,
    pub income_proof: bool,
    pub employment_proof: bool,
    pub tax_notice: bool,
    pub address_proof: bool,
    pub cover_letter: bool,
    pub verification: VerificationStatus,
}

impl DocumentChecklist {
    pub const REQUIRED_COUNT: usize = 5;

    pub fn required_present(&self) -> usize {
        [
            self.identity,
            self.income_proof,
            self.employment_proof,
            self.tax_notice,
            self.address_proof,
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
    }

    pub fn is_complete(&self) -> bool {
        self.required_present() == Self::REQUIRED_COUNT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    #[default]
    Unverified,
    Partial,
    Verified,
}

/// Household composition without any protected-class characteristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Household {
    pub adults: u8,
    pub children: u8,
    /// Monthly income of each earning household member.
    #[serde(default)]
    pub earner_incomes: Vec<f64>,
}

impl Household {
    pub fn occupants(&self) -> u32 {
        u32::from(self.adults) + u32::from(self.children)
    }
}

/// Read-only listing snapshot supplied by the property provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySnapshot {
    pub id: PropertyId,
    pub monthly_price: Option<f64>,
    pub bedrooms: u8,
    pub surface_sqm: Option<f64>,
    pub max_occupants: Option<u8>,
}

impl PropertySnapshot {
    pub fn occupancy_limit(&self) -> u32 {
        self.max_occupants
            .map(u32::from)
            .unwrap_or_else(|| u32::from(self.bedrooms) * 2 + 1)
    }
}
