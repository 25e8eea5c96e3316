use tracing::error;

/// Lowest cost bcrypt accepts; keeps hashing fast under test.
#[cfg(test)]
pub(crate) const TEST_HASH_COST: u32 = 4;

/// Hashes on the blocking pool; bcrypt is deliberately slow.
pub async fn hash_password(plain: String, cost: u32) -> anyhow::Result<String> {
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(plain, cost))
        .await?
        .map_err(|e| {
            error!(error = %e, "bcrypt hash error");
            anyhow::anyhow!(e.to_string())
        })?;
    Ok(hash)
}

#[allow(dead_code)]
pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    bcrypt::verify(plain, hash).map_err(|e| {
        error!(error = %e, "bcrypt parse hash error");
        anyhow::anyhow!(e.to_string())
    })
}
