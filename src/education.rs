use serde::Serialize;

/// Educational payload for one attack-type label
#[derive(Debug, Clone, Serialize)]
pub struct EducationContent {
    pub title: &'static str,
    pub description: &'static str,
    pub prevention_tips: Vec<&'static str>,
}

/// Look up the education payload for an attack-type label.
///
/// Labels are uppercased before matching; anything unrecognized gets the
/// generic awareness payload, never an error.
pub fn educational_content(attack_type: &str) -> EducationContent {
    match attack_type.to_uppercase().as_str() {
        "PHISHING_LINK" => EducationContent {
            title: "Phishing Link Detection",
            description: "Malicious links designed to steal credentials or install malware",
            prevention_tips: vec![
                "Hover over links to see the actual destination",
                "Check for misspelled domains",
                "Verify requests through official channels",
                "Look for HTTPS and valid certificates",
            ],
        },
        "OTP_SCAM" => EducationContent {
            title: "OTP/SMS Scam",
            description: "Attempts to steal one-time passwords or verification codes",
            prevention_tips: vec![
                "Never share OTP codes with anyone",
                "Legitimate services won't ask for OTPs via phone/email",
                "Be suspicious of urgent requests for verification codes",
                "Use authenticator apps when possible",
            ],
        },
        "LOTTERY_SCAM" => EducationContent {
            title: "Lottery/Prize Scam",
            description: "Fraudulent claims of winning prizes to extract money or information",
            prevention_tips: vec![
                "You can't win contests you didn't enter",
                "Legitimate prizes don't require upfront payments",
                "Be skeptical of 'limited time' offers",
                "Verify lottery results through official channels",
            ],
        },
        "JOB_SCAM" => EducationContent {
            title: "Employment Scam",
            description: "Fake job offers used for identity theft or advance fee fraud",
            prevention_tips: vec![
                "Research the company thoroughly",
                "Be wary of jobs requiring upfront payments",
                "Legitimate employers don't ask for personal financial info upfront",
                "Meet potential employers in person when possible",
            ],
        },
        "MARKETING_LINK" => EducationContent {
            title: "Legitimate Marketing Link",
            description: "Authentic promotional content from legitimate businesses",
            prevention_tips: vec![
                "Even legitimate links should be verified if unexpected",
                "Check the final destination domain matches the claimed sender",
                "Be cautious of offers that seem too good to be true",
                "Verify promotional codes through official channels",
            ],
        },
        _ => EducationContent {
            title: "General Security Awareness",
            description: "Stay vigilant against social engineering attacks",
            prevention_tips: vec![
                "Verify requests through official channels",
                "Be suspicious of urgent or threatening messages",
                "Don't click suspicious links or download attachments",
                "Keep software and security tools updated",
            ],
        },
    }
}
