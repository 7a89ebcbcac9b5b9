//! GraphQL documents sent to the RunPod API.

/// Every GPU type with prices and lowest-price stock.
pub const GPU_TYPES_LIST: &str = r#"
query GpuTypes {
  gpuTypes {
    id
    displayName
    manufacturer
    memoryInGb
    cudaCores
    secureCloud
    communityCloud
    securePrice
    communityPrice
    secureSpotPrice
    communitySpotPrice
    maxGpuCount
    lowestPrice(input: {gpuCount: 1}) {
      minimumBidPrice
      uninterruptablePrice
      stockStatus
      rentedCount
      totalCount
      rentalPercentage
      maxUnreservedGpuCount
      availableGpuCounts
    }
  }
}
"#;

/// Availability of one GPU type for a given count and cloud.
pub const GPU_TYPE_AVAILABILITY: &str = r#"
query GpuTypeAvailability($gpuTypeId: String!, $gpuCount: Int!, $secureCloud: Boolean) {
  gpuTypes(input: {id: $gpuTypeId}) {
    id
    displayName
    memoryInGb
    securePrice
    communityPrice
    secureSpotPrice
    communitySpotPrice
    lowestPrice(input: {gpuCount: $gpuCount, secureCloud: $secureCloud}) {
      minimumBidPrice
      uninterruptablePrice
      stockStatus
      rentedCount
      totalCount
      rentalPercentage
      maxUnreservedGpuCount
      availableGpuCounts
      countryCode
    }
  }
}
"#;

/// Datacenters visible to the account, with per-GPU availability.
pub const DATACENTER_AVAILABILITY: &str = r#"
query DatacenterAvailability {
  myself {
    datacenters {
      id
      name
      location
      region
      listed
      storageSupport
      gpuAvailability(input: {gpuCount: 1}) {
        gpuTypeId
        gpuTypeDisplayName
        available
        stockStatus
      }
    }
  }
}
"#;

/// CPU types.
pub const CPU_TYPES_LIST: &str = r#"
query CpuTypes {
  cpuTypes {
    id
    displayName
    manufacturer
    cores
    threadsPerCore
    groupId
  }
}
"#;

/// The authenticated account.
pub const MYSELF: &str = r#"
query Myself {
  myself {
    id
    email
    clientBalance
    currentSpendPerHr
    spendLimit
    pubkey
  }
}
"#;

/// Replace the account's SSH public keys.
pub const UPDATE_USER_SETTINGS: &str = r#"
mutation UpdateUserSettings($pubkey: String!) {
  updateUserSettings(input: {pubkey: $pubkey}) {
    id
    pubkey
  }
}
"#;
