//! Prompt templates for clinical eligibility reasoning and PA narrative
//! generation.

/// System instruction for the eligibility reasoner. Fixed; the reviewer
/// persona and the JSON-only output contract live here.
pub const ELIGIBILITY_SYSTEM_PROMPT: &str = "\
You are an expert medical utilization review specialist with 15+ years of \
experience evaluating prior authorization requests for insurance companies.

Your role is to:
1. Carefully analyze patient clinical data
2. Compare against insurance policy criteria
3. Make evidence-based eligibility determinations
4. Provide clear, concise reasoning citing specific data points

Always:
- Use clinical terminology accurately
- Reference specific lab values, diagnosis codes, and treatment history
- Distinguish between medical necessity and coverage policy
- Flag missing data that could affect the determination
- Provide JSON-formatted responses for system integration";

/// System instruction for narrative generation on the PA form.
pub const NARRATIVE_SYSTEM_PROMPT: &str = "\
You are a clinical documentation specialist who writes professional medical \
justifications for insurance prior authorization requests. Your narratives \
must be:

- Clinically accurate and evidence-based
- Concise but comprehensive (150-250 words)
- Written in professional medical language
- Focused on why the requested drug is medically necessary for this specific patient
- Include relevant clinical history, failed treatments, and clinical reasoning

Output format: A single cohesive paragraph suitable for submission to \
insurance companies.";

/// Inputs for the eligibility prompt. Lab values are rendered with their
/// label even when absent (rendered as 0), so the model sees a complete
/// lab panel layout.
pub struct EligibilityPromptInputs<'a> {
    pub policy_context: &'a str,
    pub policy_criteria: &'a str,
    pub patient_id: &'a str,
    pub age: u32,
    pub gender: &'a str,
    pub diagnoses: &'a str,
    pub hba1c: f64,
    pub bmi: f64,
    pub weight_lbs: f64,
    pub creatinine: f64,
    pub egfr: u32,
    pub treatment_history: &'a str,
    pub drug: &'a str,
}

/// Build the retrieval-augmented eligibility prompt.
pub fn eligibility_prompt(inputs: &EligibilityPromptInputs<'_>) -> String {
    format!(
        "\
Analyze the following patient case using policy context retrieved from our document system:

=== RETRIEVED POLICY CONTEXT ===
{policy_context}

=== INSURANCE POLICY CRITERIA ===
{policy_criteria}

=== PATIENT CLINICAL DATA ===
Patient ID: {patient_id}
Age: {age}
Gender: {gender}
Diagnoses: {diagnoses}
Lab Values:
  - HbA1c: {hba1c}%
  - BMI: {bmi} kg/m²
  - Weight: {weight} lbs
  - Creatinine: {creatinine}
  - eGFR: {egfr}

Treatment History:
{treatment_history}

Current Request: Authorization for {drug}

=== SPECIFIC POLICY REQUIREMENTS TO EVALUATE ===
{policy_criteria}

=== TASK ===
Using the retrieved policy context and clinical data:
1. Verify patient meets EACH requirement
2. Identify any clinical contraindications
3. Note strength of evidence for each criterion
4. Provide specific recommendations

Respond ONLY with valid JSON:
{{
  \"meets_criteria\": true/false,
  \"criteria_analysis\": {{
    \"requirement_1\": {{\"met\": true/false, \"evidence\": \"specific data\"}},
    ...
  }},
  \"clinical_justification\": \"Comprehensive reasoning tying together all criteria\",
  \"contraindications\": [\"list any red flags\"],
  \"confidence_score\": 0.0-1.0,
  \"missing_data\": [\"what's needed for stronger evidence\"],
  \"recommendation\": \"APPROVE/DENY/NEEDS_REVIEW\"
}}",
        policy_context = inputs.policy_context,
        policy_criteria = inputs.policy_criteria,
        patient_id = inputs.patient_id,
        age = inputs.age,
        gender = inputs.gender,
        diagnoses = inputs.diagnoses,
        hba1c = inputs.hba1c,
        bmi = inputs.bmi,
        weight = inputs.weight_lbs,
        creatinine = inputs.creatinine,
        egfr = inputs.egfr,
        treatment_history = inputs.treatment_history,
        drug = inputs.drug,
    )
}

/// Build the narrative prompt for the PA form's clinical justification.
pub fn narrative_prompt(
    patient_name: &str,
    age: u32,
    gender: &str,
    diagnoses: &str,
    drug: &str,
    clinical_reasoning: &str,
) -> String {
    let reasoning = if clinical_reasoning.trim().is_empty() {
        "Standard medical necessity"
    } else {
        clinical_reasoning
    };
    format!(
        "\
Generate a clinical justification paragraph for a Prior Authorization request:

PATIENT: {patient_name}, Age {age}, {gender}
DIAGNOSIS: {diagnoses}
DRUG: {drug}
POLICY CRITERIA: {reasoning}

Create a professional 150-250 word clinical justification narrative."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eligibility_prompt_labels_absent_labs() {
        let inputs = EligibilityPromptInputs {
            policy_context: "",
            policy_criteria: "Standard medical necessity criteria",
            patient_id: "P001",
            age: 54,
            gender: "Female",
            diagnoses: "Type 2 Diabetes (E11.9)",
            hba1c: 0.0,
            bmi: 0.0,
            weight_lbs: 0.0,
            creatinine: 0.0,
            egfr: 0,
            treatment_history: "No prior treatment history available",
            drug: "Ozempic",
        };
        let prompt = eligibility_prompt(&inputs);

        // Labels render even when values are absent/zero.
        assert!(prompt.contains("HbA1c: 0%"));
        assert!(prompt.contains("eGFR: 0"));
        assert!(prompt.contains("Authorization for Ozempic"));
        assert!(prompt.contains("Respond ONLY with valid JSON"));
    }

    #[test]
    fn test_narrative_prompt_defaults_empty_reasoning() {
        let prompt = narrative_prompt("Maria Lopez", 54, "Female", "Type 2 Diabetes", "Ozempic", "  ");
        assert!(prompt.contains("Standard medical necessity"));
    }
}
