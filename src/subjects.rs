/// Subject codes (department catalog partitions) offered on the
/// timetable. The portal has no machine-readable index, so the list is
/// enumerated here and seeded into the queue by `init`.
pub const SUBJECT_CODES: &[&str] = &[
    "AAD", "AAEC", "ACIS", "ADS", "ADV", "AFST", "AHRM", "AINS", "AIS", "ALCE", "ALS", "AOE",
    "APS", "APSC", "ARBC", "ARCH", "ART", "AS", "ASPT", "AT", "BC", "BCHM", "BDS", "BIOL", "BIT",
    "BMES", "BMSP", "BMVS", "BSE", "CEE", "CEM", "CHE", "CHEM", "CHN", "CINE", "CLA", "CMDA",
    "CMST", "CNST", "COMM", "CONS", "COS", "CRIM", "CS", "CSES", "DANC", "DASC", "ECE", "ECON",
    "EDCI", "EDCO", "EDCT", "EDEL", "EDEP", "EDHE", "EDIT", "EDP", "EDRE", "EDTE", "ENGE", "ENGL",
    "ENGR", "ENSC", "ENT", "ESM", "FIN", "FIW", "FL", "FMD", "FR", "FREC", "FST", "GBCB", "GEOG",
    "GEOS", "GER", "GIA", "GR", "GRAD", "HD", "HEB", "HIST", "HNFE", "HORT", "HTM", "HUM", "IDS",
    "IS", "ISC", "ISE", "ITAL", "ITDS", "JMC", "JPN", "JUD", "LAHS", "LAR", "LAT", "LDRS", "MACR",
    "MATH", "ME", "MGT", "MINE", "MKTG", "MN", "MS", "MSE", "MTRG", "MUS", "NANO", "NEUR", "NR",
    "NSEG", "PAPA", "PHIL", "PHS", "PHYS", "PM", "PORT", "PPE", "PPWS", "PR", "PSCI", "PSVP",
    "PSYC", "REAL", "RED", "RLCL", "RTM", "RUS", "SBIO", "SOC", "SPAN", "SPES", "SPIA", "STAT",
    "STL", "STS", "SYSB", "TA", "TBMH", "UAP", "UH", "UNIV", "VM", "WATR", "WGS",
];
