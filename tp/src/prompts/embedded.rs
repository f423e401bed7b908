//! Embedded fallback prompts
//!
//! These are compiled into the binary and used when no override file is found.
//! Templates are rendered by handlebars in strict mode, so every variable
//! referenced here must be present in the render context.

/// Suitability judge: weather text in, JSON verdict out
pub const SUITABILITY_JUDGE: &str = r#"You are an expert travel advisor AI agent. Analyze the following weather data and make a decision.

Weather Data for {{destination}} on {{travel_date}}:
{{weather}}

Your task:
1. Analyze temperature, precipitation, wind, humidity
2. Decide if weather is SUITABLE or NOT_SUITABLE for travel
3. Consider:
   - Extreme temperatures (below 5°C or above 40°C are concerning)
   - Heavy rain, storms, severe weather warnings
   - Strong winds disrupting activities
   - Dangerous conditions

4. Provide your decision in JSON format:
{
    "decision": "SUITABLE" or "NOT_SUITABLE",
    "reasoning": "Brief explanation",
    "concerns": ["list", "of", "concerns"] or [],
    "recommendation": "What you recommend"
}

Be realistic but not overly cautious. Light rain or mild temperatures are usually acceptable.

Respond with JSON only:"#;

/// Alternative finder: rejected destination in, JSON list of cities out
pub const ALTERNATIVE_FINDER: &str = r#"You are an expert travel advisor. The traveler wanted to go to {{original_destination}} from {{starting_city}} on {{travel_date}}, but weather is unsuitable.

Reason: {{reason}}

Suggest {{count}} alternative destinations with better weather:
1. Accessible from {{starting_city}}
2. Similar attractions
3. Good weather during that season
4. Worth visiting

Respond in JSON format:
{
    "alternatives": [
        {
            "city": "City Name, Country",
            "reason": "Why this is a good alternative",
            "expected_weather": "Brief weather description"
        }
    ]
}

Include exactly {{count}} entries in "alternatives".

JSON only:"#;

/// Itinerary composer: option tables in, day-by-day plan out
pub const ITINERARY_COMPOSER: &str = r#"You are a highly organized travel planner.

Using the following information, build a day-wise itinerary for a visitor spending {{days}} days in {{city}}.

Flights:
{{flights}}

Hotels:
{{hotels}}

Attractions:
{{attractions}}

Requirements:
- Prioritize top-rated attractions each day.
- Consider hotel location for efficient planning.
- Include meal suggestions where possible.
- Make the plan realistic for {{days}} days: if there are too many attractions, focus on the best.
- Format the output in a clear, day-by-day itinerary with headings.

**Before the itinerary, after you mention the best flight and hotel, present an Estimated Budget section like this:**

- Best roundtrip flight ticket: $[flight_price] x 2
- Hotel ({{days}} nights): $[hotel_price_per_night] x {{days}}
- Other local expenses (meals, transit, attractions): Estimate an appropriate value for {{city}}
- **Total estimated budget for {{days}} days: $[total_amount] USD**

Show each of the above clearly, then write a friendly summary like:
"This covers your roundtrip airfare, hotel stay, and typical daily expenses in {{city}}."

Do NOT show how you calculated the numbers, just display the prices as listed above.

Then continue with the day-wise itinerary as usual.

Example format:
**Day 1: Arrival & Exploration**
- Morning: Check into [Hotel Name]
- Afternoon: Visit [Attraction]
- Evening: Dinner at [Area]

Continue this format for all {{days}} days.
"#;

/// Get an embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    match name {
        "suitability-judge" => Some(SUITABILITY_JUDGE),
        "alternative-finder" => Some(ALTERNATIVE_FINDER),
        "itinerary-composer" => Some(ITINERARY_COMPOSER),
        _ => None,
    }
}
