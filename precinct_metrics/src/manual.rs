/*!

This is the long-form manual for `precinct_metrics` and `precinct-support`.

## Input format

One CSV file per state, named `{year}-{state}-precinct-general.csv` where `state` is
the lowercase two-letter postal code (for instance `2020-az-precinct-general.csv`).
The first row is the header. The following columns are read, all other columns
are ignored:

| column                                  | content                                   | required |
|-----------------------------------------|-------------------------------------------|----------|
| `precinct`                              | precinct name, the grouping key           | yes      |
| `office`                                | the office of the race (`PRESIDENT`)      | yes      |
| `party_simplified` or `party_detailed`  | the party of the candidate                | yes      |
| `mode`                                  | voting mode (`TOTAL`, `ABSENTEE`, ...)    | yes      |
| `votes`                                 | the number of votes, integer or decimal   | yes      |
| `candidate`                             | the name of the candidate, may be empty   | yes      |
| `state_po`                              | the state postal code                     | yes      |
| `year`                                  | the year of the election                  | yes      |
| `stage`                                 | election stage (`GEN`, `PRI`)             | yes      |
| `writein`                               | `TRUE` / `FALSE`                          | no       |

When both party columns are present, `party_simplified` is used.

## Support analysis

For each precinct, the votes of the candidates of the qualifying parties
(by default `DEMOCRAT` and `REPUBLICAN`) are summed. This sum is the
denominator: votes for other parties do not count. Each candidate then gets
one row with its share of this sum, in percent.

Rows with a share of 0% or less, or above 100%, are removed. Precincts whose
sum is zero are removed. These removals are not errors; they are counted and
reported in the logs.

The output has the following columns, in this order:
`precinct_id`, `precinct_name`, `election_year`, `total_votes`, `candidate`,
`candidate_party`, `support_percent`, `state`.

`precinct_id` is the state code and the precinct name joined with `_`
(`AZ_101`). `total_votes` is the precinct sum, rounded down to an integer.

## Turnout analysis

The returns of some states include rows with the candidate `REGISTERED VOTERS`.
The turnout analysis uses them to compute, per precinct:
- the turnout: all the non write-in votes of the race divided by the registered voters.
  When the file has a `writein` column, only the rows marked `FALSE` are counted: a blank
  cell is not. Without the column, every row of the race is counted.
- the support of the Democrat and the Republican candidates, against the same total.

Precincts with a turnout of 0% or less, or above 100%, are removed.
States without any registered voters row are skipped. For states where only some
precincts have them, the `registrationPolicy` option decides: `dropPrecinct`
(the default) removes these precincts only, `dropState` skips the whole state.

## Configuration

All the options have defaults. They can be set in a JSON file passed with `--config`:

```json
{
  "inputDirectory": "raw/2020_precinct",
  "outputDirectory": "processed",
  "electionYear": 2020,
  "race": { "office": "PRESIDENT", "mode": "TOTAL", "stage": "GEN" },
  "qualifyingParties": ["DEMOCRAT", "REPUBLICAN"],
  "states": ["AZ", "GA"],
  "analysis": "support",
  "turnout": {
    "registeredVotersLabel": "REGISTERED VOTERS",
    "democratParty": "DEMOCRAT",
    "republicanParty": "REPUBLICAN",
    "registrationPolicy": "dropPrecinct"
  }
}
```

Relative directories are resolved against the directory of the configuration
file. The command line flags `--input`, `--out`, `--year`, `--states`,
`--analysis` and `--registration-policy` take precedence over the file.

## Failures

A state that cannot be read (missing file, missing column, invalid number) or
that has no data for the race is skipped with a warning. The batch fails only if
no state produces any row, in which case nothing is written.

*/
