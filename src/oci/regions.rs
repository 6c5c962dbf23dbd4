//! OCI Regions
//!
//! Region names derived from resource OCIDs.

/// Short region keys as they appear inside OCIDs
const REGION_KEYS: &[(&str, &str)] = &[
    ("iad", "us-ashburn-1"),
    ("phx", "us-phoenix-1"),
    ("sjc", "us-sanjose-1"),
    ("ord", "us-chicago-1"),
    ("yyz", "ca-toronto-1"),
    ("yul", "ca-montreal-1"),
    ("gru", "sa-saopaulo-1"),
    ("vcp", "sa-vinhedo-1"),
    ("scl", "sa-santiago-1"),
    ("qro", "mx-queretaro-1"),
    ("lhr", "uk-london-1"),
    ("cwl", "uk-cardiff-1"),
    ("fra", "eu-frankfurt-1"),
    ("ams", "eu-amsterdam-1"),
    ("zrh", "eu-zurich-1"),
    ("cdg", "eu-paris-1"),
    ("mrs", "eu-marseille-1"),
    ("lin", "eu-milan-1"),
    ("arn", "eu-stockholm-1"),
    ("mad", "eu-madrid-1"),
    ("dxb", "me-dubai-1"),
    ("jed", "me-jeddah-1"),
    ("auh", "me-abudhabi-1"),
    ("mtz", "il-jerusalem-1"),
    ("jnb", "af-johannesburg-1"),
    ("bom", "ap-mumbai-1"),
    ("hyd", "ap-hyderabad-1"),
    ("sin", "ap-singapore-1"),
    ("nrt", "ap-tokyo-1"),
    ("kix", "ap-osaka-1"),
    ("icn", "ap-seoul-1"),
    ("yny", "ap-chuncheon-1"),
    ("syd", "ap-sydney-1"),
    ("mel", "ap-melbourne-1"),
];

/// Region name for a short key, or the input when it is already a name
pub fn region_name(key: &str) -> String {
    let key = key.to_lowercase();
    REGION_KEYS
        .iter()
        .find(|(short, _)| *short == key)
        .map(|(_, name)| name.to_string())
        .unwrap_or(key)
}

/// Region encoded in an OCID (`ocid1.<type>.<realm>.<region>.<id>`).
///
/// Global resources such as tenancies carry an empty region segment.
pub fn region_from_ocid(ocid: &str) -> Option<String> {
    let segment = ocid.split('.').nth(3)?;
    if segment.is_empty() {
        return None;
    }
    Some(region_name(segment))
}
