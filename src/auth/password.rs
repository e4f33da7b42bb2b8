use crate::error::AppError;

/// Lowest cost bcrypt accepts.
pub const MIN_COST: u32 = 4;
/// Highest cost bcrypt accepts.
pub const MAX_COST: u32 = 31;
/// Cost used in production unless configured otherwise.
pub const DEFAULT_COST: u32 = 10;

/// One-way salted password hashing with bcrypt.
///
/// `verify` distinguishes a mismatch (`Ok(false)`) from a digest that bcrypt cannot
/// parse (`Err(AppError::InternalServerError)`).
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Result<Self, AppError> {
        if !(MIN_COST..=MAX_COST).contains(&cost) {
            return Err(AppError::InternalServerError(format!(
                "bcrypt cost {} outside {}..={}",
                cost, MIN_COST, MAX_COST
            )));
        }
        Ok(Self { cost })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        Ok(bcrypt::hash(password, self.cost)?)
    }

    pub fn verify(&self, password: &str, hashed_password: &str) -> Result<bool, AppError> {
        Ok(bcrypt::verify(password, hashed_password)?)
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self { cost: DEFAULT_COST }
    }
}
