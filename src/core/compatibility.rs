use crate::models::{BloodType, BloodTypeError};
use BloodType::*;

/// Donor blood types a patient of the given type can safely receive
///
/// Standard ABO/Rh red cell compatibility. Every entry contains the patient's
/// own type and O- (universal donor); AB+ (universal recipient) accepts all eight.
pub fn compatible_donor_types(patient: BloodType) -> &'static [BloodType] {
    match patient {
        APositive => &[APositive, ANegative, OPositive, ONegative],
        ANegative => &[ANegative, ONegative],
        BPositive => &[BPositive, BNegative, OPositive, ONegative],
        BNegative => &[BNegative, ONegative],
        AbPositive => &[
            APositive, ANegative, BPositive, BNegative, AbPositive, AbNegative, OPositive, ONegative,
        ],
        AbNegative => &[ANegative, BNegative, AbNegative, ONegative],
        OPositive => &[OPositive, ONegative],
        ONegative => &[ONegative],
    }
}

/// Same lookup from an unvalidated string
pub fn compatible_donor_types_for(patient: &str) -> Result<&'static [BloodType], BloodTypeError> {
    patient.parse().map(compatible_donor_types)
}

#[inline]
pub fn can_donate(donor: BloodType, patient: BloodType) -> bool {
    compatible_donor_types(patient).contains(&donor)
}

/// Patient blood types a donor of the given type can give to
pub fn recipients_of(donor: BloodType) -> Vec<BloodType> {
    BloodType::ALL
        .iter()
        .copied()
        .filter(|patient| can_donate(donor, *patient))
        .collect()
}
