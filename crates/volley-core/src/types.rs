//! Typed views of RPR warfare data types.
//!
//! These decode the wire layouts directly, independent of the loaded schema,
//! and back the field decoders a run configuration may bind to parameters.

use serde::Serialize;
use std::fmt;
use volley_schema::{ByteReader, DecodeError};

macro_rules! coded_enum {
    ($name:ident, $repr:ty, $read:ident, $doc:expr, { $($variant:ident = $code:literal => $label:literal,)+ }) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum $name {
            $(
                #[doc = $label]
                $variant,
            )+
        }

        impl $name {
            /// Every enumerator in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire code of the enumerator.
            pub fn code(self) -> $repr {
                match self {
                    $($name::$variant => $code,)+
                }
            }

            /// Enumerator name as declared in the FOM.
            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            /// Maps a wire code back to its enumerator.
            pub fn from_code(code: $repr) -> Option<Self> {
                match code {
                    $($code => Some($name::$variant),)+
                    _ => None,
                }
            }

            /// Decodes the enumerator from its wire representation.
            pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
                let code = ByteReader::new(bytes).$read()?;
                Self::from_code(code).ok_or_else(|| {
                    DecodeError::InvalidValue(format!("{} is not a valid {}", code, stringify!($name)))
                })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

coded_enum!(FuseType, i16, read_i16_be, "Fuse of a fired or detonated munition.", {
        Other = 0 => "Other",
        IntelligentInfluence = 10 => "IntelligentInfluence",
        Sensor = 20 => "Sensor",
        SelfDestruct = 30 => "SelfDestruct",
        UltraQuick = 40 => "UltraQuick",
        Body = 50 => "Body",
        DeepIntrusion = 60 => "DeepIntrusion",
        Multifunction = 100 => "Multifunction",
        PointDetonationPd = 200 => "PointDetonation_PD",
        BaseDetonationBd = 300 => "BaseDetonation_BD",
        Contact = 1000 => "Contact",
        ContactInstantImpact = 1100 => "ContactInstantImpact",
        ContactDelayed = 1200 => "ContactDelayed",
        Contact10msDelay = 1201 => "Contact10msDelay",
        Contact20msDelay = 1202 => "Contact20msDelay",
        Contact50msDelay = 1205 => "Contact50msDelay",
        Contact60msDelay = 1206 => "Contact60msDelay",
        Contact100msDelay = 1210 => "Contact100msDelay",
        Contact125msDelay = 1212 => "Contact125msDelay",
        Contact250msDelay = 1225 => "Contact250msDelay",
        ContactElectronicObliqueContact = 1300 => "ContactElectronicObliqueContact",
        ContactGraze = 1400 => "ContactGraze",
        ContactCrush = 1500 => "ContactCrush",
        ContactHydrostatic = 1600 => "ContactHydrostatic",
        ContactMechanical = 1700 => "ContactMechanical",
        ContactChemical = 1800 => "ContactChemical",
        ContactPiezoelectric = 1900 => "ContactPiezoelectric",
        ContactPointInitiating = 1910 => "ContactPointInitiating",
        ContactPointInitiatingBaseDetonating = 1920 => "ContactPointInitiatingBaseDetonating",
        ContactBaseDetonating = 1930 => "ContactBaseDetonating",
        ContactBallisticCapAndBase = 1940 => "ContactBallisticCapAndBase",
        ContactBase = 1950 => "ContactBase",
        ContactNose = 1960 => "ContactNose",
        ContactFittedInStandoffProbe = 1970 => "ContactFittedInStandoffProbe",
        ContactNonAligned = 1980 => "ContactNonAligned",
        Timed = 2000 => "Timed",
        TimedProgrammable = 2100 => "TimedProgrammable",
        TimedBurnout = 2200 => "TimedBurnout",
        TimedPyrotechnic = 2300 => "TimedPyrotechnic",
        TimedElectronic = 2400 => "TimedElectronic",
        TimedBaseDelay = 2500 => "TimedBaseDelay",
        TimedReinforcedNoseImpactDelay = 2600 => "TimedReinforcedNoseImpactDelay",
        TimedShortDelayImpact = 2700 => "TimedShortDelayImpact",
        Timed10msDelay = 2701 => "Timed10msDelay",
        Timed20msDelay = 2702 => "Timed20msDelay",
        Timed50msDelay = 2705 => "Timed50msDelay",
        Timed60msDelay = 2706 => "Timed60msDelay",
        Timed100msDelay = 2710 => "Timed100msDelay",
        Timed125msDelay = 2712 => "Timed125msDelay",
        Timed250msDelay = 2725 => "Timed250msDelay",
        TimedNoseMountedVariableDelay = 2800 => "TimedNoseMountedVariableDelay",
        TimedLongDelaySide = 2900 => "TimedLongDelaySide",
        TimedSelectableDelay = 2910 => "TimedSelectableDelay",
        TimedImpact = 2920 => "TimedImpact",
        TimedSequence = 2930 => "TimedSequence",
        Proximity = 3000 => "Proximity",
        ProximityActiveLaser = 3100 => "ProximityActiveLaser",
        ProximityMagneticMagpolarity = 3200 => "ProximityMagneticMagpolarity",
        ProximityActiveDopplerRadar = 3300 => "ProximityActiveDopplerRadar",
        ProximityRadioFrequencyRF = 3400 => "ProximityRadioFrequencyRF",
        ProximityProgrammable = 3500 => "ProximityProgrammable",
        ProximityProgrammablePrefragmented = 3600 => "ProximityProgrammablePrefragmented",
        ProximityInfrared = 3700 => "ProximityInfrared",
        Command = 4000 => "Command",
        CommandElectronicRemotelySet = 4100 => "CommandElectronicRemotelySet",
        Altitude = 5000 => "Altitude",
        AltitudeRadioAltimeter = 5100 => "AltitudeRadioAltimeter",
        AltitudeAirBurst = 5200 => "AltitudeAirBurst",
        Depth = 6000 => "Depth",
        Acoustic = 7000 => "Acoustic",
        Pressure = 8000 => "Pressure",
        PressureDelay = 8010 => "PressureDelay",
        Inert = 8100 => "Inert",
        Dummy = 8110 => "Dummy",
        Practice = 8120 => "Practice",
        PlugRepresenting = 8130 => "PlugRepresenting",
        Training = 8150 => "Training",
        Pyrotechnic = 9000 => "Pyrotechnic",
        PyrotechnicDelay = 9010 => "PyrotechnicDelay",
        ElectroOptical = 9100 => "ElectroOptical",
        ElectroMechanical = 9110 => "ElectroMechanical",
        ElectroMechanicalNose = 9120 => "ElectroMechanicalNose",
        Strikerless = 9200 => "Strikerless",
        StrikerlessNoseImpact = 9210 => "StrikerlessNoseImpact",
        StrikerlessCompressionIgnition = 9220 => "StrikerlessCompressionIgnition",
        CompressionIgnition = 9300 => "CompressionIgnition",
        CompressionIgnitionStrikerlessNoseImpact = 9310 => "CompressionIgnitionStrikerlessNoseImpact",
        Percussion = 9400 => "Percussion",
        PercussionInstantaneous = 9410 => "PercussionInstantaneous",
        Electronic = 9500 => "Electronic",
        ElectronicInternallyMounted = 9510 => "ElectronicInternallyMounted",
        ElectronicRangeSetting = 9520 => "ElectronicRangeSetting",
        ElectronicProgrammed = 9530 => "ElectronicProgrammed",
        Mechanical = 9600 => "Mechanical",
        MechanicalNose = 9610 => "MechanicalNose",
        MechanicalTail = 9620 => "MechanicalTail",
});

coded_enum!(WarheadType, i16, read_i16_be, "Warhead of a fired or detonated munition.", {
        Other = 0 => "Other",
        CargoVariableSubmunitions = 10 => "CargoVariableSubmunitions",
        FuelAirExplosive = 20 => "FuelAirExplosive",
        GlassBeads = 30 => "GlassBeads",
        Warhead1um = 31 => "Warhead_1um",
        Warhead5um = 32 => "Warhead_5um",
        Warhead10um = 33 => "Warhead_10um",
        HighExplosive = 1000 => "HighExplosive",
        HePlastic = 1100 => "HE_Plastic",
        HeIncendiary = 1200 => "HE_Incendiary",
        HeFragmentation = 1300 => "HE_Fragmentation",
        HeAntitank = 1400 => "HE_Antitank",
        HeBomblets = 1500 => "HE_Bomblets",
        HeShapedCharge = 1600 => "HE_ShapedCharge",
        HeContinuousRod = 1610 => "HE_ContinuousRod",
        HeTungstenBall = 1615 => "HE_TungstenBall",
        HeBlastFragmentation = 1620 => "HE_BlastFragmentation",
        HeSteerableDartswithHE = 1625 => "HE_SteerableDartswithHE",
        HeDarts = 1630 => "HE_Darts",
        HeFlechettes = 1635 => "HE_Flechettes",
        HeDirectedFragmentation = 1640 => "HE_DirectedFragmentation",
        HeSemiArmorPiercing = 1645 => "HE_SemiArmorPiercing",
        HeShapedChargeFragmentation = 1650 => "HE_ShapedChargeFragmentation",
        HeSemiArmorPiercingFragmentation = 1655 => "HE_SemiArmorPiercingFragmentation",
        HeHollowCharge = 1660 => "HE_HollowCharge",
        HeDoubleHollowCharge = 1665 => "HE_DoubleHollowCharge",
        HeGeneralPurpose = 1670 => "HE_GeneralPurpose",
        HeBlastPenetrator = 1675 => "HE_BlastPenetrator",
        HeRodPenetrator = 1680 => "HE_RodPenetrator",
        HeAntipersonnel = 1685 => "HE_Antipersonnel",
        Smoke = 2000 => "Smoke",
        Illumination = 3000 => "Illumination",
        Practice = 4000 => "Practice",
        Kinetic = 5000 => "Kinetic",
        Mines = 6000 => "Mines",
        Nuclear = 7000 => "Nuclear",
        NuclearIMT = 7010 => "NuclearIMT",
        ChemicalGeneral = 8000 => "ChemicalGeneral",
        ChemicalBlisterAgent = 8100 => "ChemicalBlisterAgent",
        HdMustard = 8110 => "HD_Mustard",
        ThickenedHDMustard = 8115 => "ThickenedHD_Mustard",
        DustyHDMustard = 8120 => "DustyHD_Mustard",
        ChemicalBloodAgent = 8200 => "ChemicalBloodAgent",
        AcHcn = 8210 => "AC_HCN",
        CkCnci = 8215 => "CK_CNCI",
        CgPhosgene = 8220 => "CG_Phosgene",
        ChemicalNerveAgent = 8300 => "ChemicalNerveAgent",
        Vx = 8310 => "VX",
        ThickenedVX = 8315 => "ThickenedVX",
        DustyVX = 8320 => "DustyVX",
        GaTabun = 8325 => "GA_Tabun",
        ThickenedGATabun = 8330 => "ThickenedGA_Tabun",
        DustyGATabun = 8335 => "DustyGA_Tabun",
        GbSarin = 8340 => "GB_Sarin",
        ThickenedGBSarin = 8345 => "ThickenedGB_Sarin",
        DustyGBSarin = 8350 => "DustyGB_Sarin",
        GdSoman = 8355 => "GD_Soman",
        ThickenedGDSoman = 8360 => "ThickenedGD_Soman",
        DustyGDSoman = 8365 => "DustyGD_Soman",
        Gf = 8370 => "GF",
        ThickenedGF = 8375 => "ThickenedGF",
        DustyGF = 8380 => "DustyGF",
        Biological = 9000 => "Biological",
        BiologicalVirus = 9100 => "BiologicalVirus",
        BiologicalBacteria = 9200 => "BiologicalBacteria",
        BiologicalRickettsia = 9300 => "BiologicalRickettsia",
        BiologicalGeneticallyModifiedMicroOrganisms = 9400 => "BiologicalGeneticallyModifiedMicroOrganisms",
        BiologicalToxin = 9500 => "BiologicalToxin",
});

coded_enum!(DetonationResultCode, u8, read_u8, "Outcome of a munition detonation.", {
        Other = 0 => "Other",
        EntityImpact = 1 => "EntityImpact",
        EntityProximateDetonation = 2 => "EntityProximateDetonation",
        GroundImpact = 3 => "GroundImpact",
        GroundProximateDetonation = 4 => "GroundProximateDetonation",
        Detonation = 5 => "Detonation",
        NoResult = 6 => "None",
        HeHitSmall = 7 => "HE_hit_Small",
        HeHitMedium = 8 => "HE_hit_Medium",
        HeHitLarge = 9 => "HE_hit_Large",
        ArmorPiercingHit = 10 => "ArmorPiercingHit",
        DirtBlastSmall = 11 => "DirtBlast_Small",
        DirtBlastMedium = 12 => "DirtBlast_Medium",
        DirtBlastLarge = 13 => "DirtBlast_Large",
        WaterBlastSmall = 14 => "WaterBlast_Small",
        WaterBlastMedium = 15 => "WaterBlast_Medium",
        WaterBlastLarge = 16 => "WaterBlast_Large",
        AirHit = 17 => "AirHit",
        BuildingHitSmall = 18 => "BuildingHit_Small",
        BuildingHitMedium = 19 => "BuildingHit_Medium",
        BuildingHitLarge = 20 => "BuildingHit_Large",
        MineClearingLineCharge = 21 => "MineClearingLineCharge",
        EnvironmentObjectImpact = 22 => "EnvironmentObjectImpact",
        EnvironmentObjectProximateDetonation = 23 => "EnvironmentObjectProximateDetonation",
        WaterImpact = 24 => "WaterImpact",
        AirBurst = 25 => "AirBurst",
        KillWithFragmentType1 = 26 => "Kill_with_fragment_type_1",
        KillWithFragmentType2 = 27 => "Kill_with_fragment_type_2",
        KillWithFragmentType3 = 28 => "Kill_with_fragment_type_3",
        KillWithFragmentType1AfterFlyOutFailure = 29 => "Kill_with_fragment_type_1_after_fly_out_failure",
        KillWithFragmentType2AfterFlyOutFailure = 30 => "Kill_with_fragment_type_2_after_fly_out_failure",
        MissDueToFlyOutFailure = 31 => "Miss_due_to_fly_out_failure",
        MissDueToEndGameFailure = 32 => "Miss_due_to_end_game_failure",
        MissDueToFlyOutAndEndGameFailure = 33 => "Miss_due_to_fly_out_and_end_game_failure",
});

coded_enum!(EntityKind, u8, read_u8, "Top-level kind of a simulated entity.", {
        Other = 0 => "Other",
        Platform = 1 => "Platform",
        Munition = 2 => "Munition",
        LifeForm = 3 => "LifeForm",
        Environmental = 4 => "Environmental",
        CulturalFeature = 5 => "CulturalFeature",
        Supply = 6 => "Supply",
        Radio = 7 => "Radio",
        Expendable = 8 => "Expendable",
        Sensor = 9 => "Sensor",
        Emitter = 10 => "Emitter",
});

coded_enum!(MunitionDomain, u8, read_u8, "Domain a munition is intended for.", {
        Other = 0 => "Other",
        AntiAir = 1 => "AntiAir",
        AntiArmor = 2 => "AntiArmor",
        AntiGuidedWeapon = 3 => "AntiGuidedWeapon",
        Antiradar = 4 => "Antiradar",
        AntiSatellite = 5 => "AntiSatellite",
        AntiShip = 6 => "AntiShip",
        AntiSubmarine = 7 => "AntiSubmarine",
        AntiPersonnel = 8 => "AntiPersonnel",
        BattlefieldSupport = 9 => "BattlefieldSupport",
        Strategic = 10 => "Strategic",
        Tactical = 11 => "Tactical",
});

/// Leading fields of an `EntityTypeStruct`.
///
/// Only the kind and domain octets are read; the remaining fields of the
/// record are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EntityType {
    /// Entity kind.
    pub kind: EntityKind,
    /// Domain; interpreted as a munition domain.
    pub domain: MunitionDomain,
}

impl EntityType {
    /// Decodes the kind and domain octets.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = ByteReader::new(bytes);
        let kind = reader.read_u8()?;
        let domain = reader.read_u8()?;
        Ok(Self {
            kind: EntityKind::from_code(kind)
                .ok_or_else(|| DecodeError::InvalidValue(format!("{} is not a valid EntityKind", kind)))?,
            domain: MunitionDomain::from_code(domain).ok_or_else(|| {
                DecodeError::InvalidValue(format!("{} is not a valid MunitionDomain", domain))
            })?,
        })
    }

    /// Whether the entity is a munition.
    pub fn is_munition(&self) -> bool {
        self.kind == EntityKind::Munition
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.domain)
    }
}

/// Geocentric position in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WorldLocation {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Z coordinate.
    pub z: f64,
}

impl WorldLocation {
    /// Decodes three big-endian 64-bit floats.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = ByteReader::new(bytes);
        Ok(Self {
            x: reader.read_f64_be()?,
            y: reader.read_f64_be()?,
            z: reader.read_f64_be()?,
        })
    }
}

impl fmt::Display for WorldLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Velocity in meters per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VelocityVector {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
}

impl VelocityVector {
    /// Decodes three big-endian 32-bit floats.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = ByteReader::new(bytes);
        Ok(Self {
            x: reader.read_f32_be()?,
            y: reader.read_f32_be()?,
            z: reader.read_f32_be()?,
        })
    }
}

impl fmt::Display for VelocityVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}
