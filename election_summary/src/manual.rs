/*!

This is the long-form manual for `election_summary` and `elexsum`.

## Input format

The command line reads county-level results from a CSV file (default) or an Excel
spreadsheet (`--input-type xlsx`). The first row is a header with the following
columns, in any order:

| column      | required | content                                                    |
|-------------|----------|------------------------------------------------------------|
| `date`      | yes      | the date of the contest, passed through as is              |
| `office`    | yes      | the office label, for example `President` or `U.S. Rep - 1` |
| `district`  | no       | the district number, for district-based offices            |
| `county`    | yes      | the reporting county                                       |
| `candidate` | yes      | the candidate name, usually written `Last, First`          |
| `party`     | yes      | the party code                                             |
| `votes`     | yes      | the number of votes, a non-negative integer                |

Rows with an empty office, party, candidate or county are rejected with their file
and line number.

Before the results reach the library, each row is cleaned:
* names written `Last, First` are split into last and first name
* party codes are upper-cased; codes starting with `GOP` become `REP`, codes starting with `DEM` become `DEM`
* offices containing `Pres` get the slug `president` and no district, whatever the district column says; offices containing `Rep` are
  renamed `U.S. House of Representatives`, with slug `us-house` and the district taken
  from the text after the last `-`

## Races and candidates

A race is identified by its office and, for district-based offices, its district.
A candidate is identified within a race by its party and its name: two candidates
with the same name but different parties are different candidates.
A name without a comma and the same name split with an empty first name are the
same candidate; the name of the first record is kept.

A county should report only once per candidate. By default, repeated reports are
added together (`duplicateCountyMode: accumulate`). With `reject`, a repeated report
stops the processing.

## Summary rules

For every race:
* the statewide total of a candidate is the sum of its county results
* the racewide total is the sum of the statewide totals
* candidates are sorted by decreasing total; candidates with the same total are sorted by party, then name
* the vote share of each candidate is its total divided by the racewide total, in percent.
  It is zero when no vote was cast in the race.
* if the two top candidates have the same total, the race is a tie and nobody wins
* otherwise the top candidate wins, with a margin of victory equal to the difference
  between the two top totals divided by the racewide total, in percentage points
* a candidate running alone wins, without margin of victory

Vote shares and margins are rounded to a fixed number of decimal places (2 by default,
`decimalPlaces` in the configuration or `--decimal-places` on the command line). Midpoints
are rounded away from zero.

## Output format

The CSV output has one row per race and candidate, with the columns
`date`, `office`, `office_slug`, `district`, `last_name`, `first_name`, `party`,
`all_votes`, `votes`, `vote_pct`, `winner`, `margin_of_vic`, `tie_race`.
Flags are written `X` when set and left empty otherwise.

The JSON output (`--output-format json`) contains the same information, grouped by race.

*/
